//! Error types for bgmix-mixer
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Which pipeline input an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    /// Primary track, mixed at unit gain
    Main,
    /// Background track, mixed at the requested gain
    Background,
}

impl std::fmt::Display for InputRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputRole::Main => write!(f, "main"),
            InputRole::Background => write!(f, "background"),
        }
    }
}

/// Decoder failures
///
/// Returned by every `Decoder` backend; the pipeline wraps it in
/// `Error::Decode` together with the input it came from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Container format not recognized
    #[error("Unrecognized audio format: {0}")]
    Probe(String),

    /// Container has no decodable audio track
    #[error("No audio track found")]
    NoAudioTrack,

    /// Track codec has no registered decoder
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// Track does not declare a sample rate
    #[error("Sample rate not found")]
    MissingSampleRate,

    /// Stream is corrupt or yields no usable audio
    #[error("Malformed audio stream: {0}")]
    Malformed(String),
}

/// Main error type for bgmix-mixer
#[derive(Error, Debug)]
pub enum Error {
    /// One of the inputs could not be decoded
    #[error("Failed to decode {input} audio: {source}")]
    Decode {
        input: InputRole,
        #[source]
        source: DecodeError,
    },

    /// Trim window extends past the end of the buffer
    #[error("Trim window [{start_frame}, {end_frame}) exceeds available {available} frames")]
    Range {
        start_frame: usize,
        end_frame: usize,
        available: usize,
    },

    /// Inputs have different sample rates (no resampling)
    #[error("Sample rate mismatch: primary {primary} Hz, secondary {secondary} Hz")]
    SampleRateMismatch { primary: u32, secondary: u32 },

    /// Invalid timing parameters
    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    /// Sample buffer construction violated an invariant
    #[error("Invalid sample buffer: {0}")]
    InvalidBuffer(String),

    /// Bytes are not a canonical PCM WAV file
    #[error("Invalid WAV data: {0}")]
    InvalidWav(String),

    /// Malformed data: URL
    #[error("Invalid data URL: {0}")]
    DataUrl(String),

    /// Pipeline cancelled between stages
    #[error("Mix cancelled")]
    Cancelled,

    /// Configuration errors (from bgmix-common)
    #[error(transparent)]
    Config(#[from] bgmix_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Background task failures
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using bgmix-mixer Error
pub type Result<T> = std::result::Result<T, Error>;
