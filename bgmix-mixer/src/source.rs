//! Encoded pipeline inputs
//!
//! `EncodedAudio` carries the raw bytes of one input together with an optional
//! format hint. Inputs arrive either as files (hint from the extension) or as
//! `data:` URLs (hint from the MIME type).

use crate::error::{Error, Result};
use base64::{engine::general_purpose, Engine as _};
use std::path::Path;

/// Raw encoded audio plus an optional container hint ("wav", "mp3", …)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAudio {
    pub bytes: Vec<u8>,
    pub format_hint: Option<String>,
}

impl EncodedAudio {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format_hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.format_hint = Some(hint.into());
        self
    }

    /// Wrap bytes read from `path`, using its lowercased extension as the hint
    pub fn from_path_bytes(path: &Path, bytes: Vec<u8>) -> Self {
        let hint = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        Self {
            bytes,
            format_hint: hint,
        }
    }

    /// Read a file, using its extension as the hint
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_path_bytes(path, bytes))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL
    ///
    /// Recognized MIME types become a format hint; anything else decodes with
    /// no hint and relies on content probing.
    ///
    /// # Errors
    /// - `DataUrl` if the `data:` prefix or `;base64,` marker is missing, or
    ///   the payload is not valid base64
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| Error::DataUrl("missing 'data:' prefix".to_string()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::DataUrl("missing ',' before payload".to_string()))?;

        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::DataUrl("only base64 data URLs are supported".to_string()))?;
        // Drop parameters such as ";codecs=opus"
        let mime = mime.split(';').next().unwrap_or_default().trim();

        let bytes = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::DataUrl(format!("invalid base64 payload: {}", e)))?;

        Ok(Self {
            bytes,
            format_hint: hint_for_mime(mime).map(str::to_string),
        })
    }

    pub fn format_hint(&self) -> Option<&str> {
        self.format_hint.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Container hint for a MIME type, or `None` when unrecognized
pub fn hint_for_mime(mime: &str) -> Option<&'static str> {
    match mime.to_ascii_lowercase().as_str() {
        "audio/wav" | "audio/x-wav" => Some("wav"),
        "audio/mpeg" => Some("mp3"),
        "audio/ogg" => Some("ogg"),
        "audio/aac" => Some("aac"),
        "audio/flac" => Some("flac"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        "video/quicktime" => Some("mov"),
        "video/x-msvideo" => Some("avi"),
        _ => None,
    }
}
