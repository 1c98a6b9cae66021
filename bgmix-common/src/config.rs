//! Configuration loading and resolution
//!
//! Configuration file resolution follows this priority order:
//! 1. Explicit path (command-line `--config`)
//! 2. `BGMIX_CONFIG` environment variable
//! 3. User config file (`<config dir>/bgmix/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! An explicitly named file (1 or 2) must exist and parse. The implicit user
//! file is optional: when it is missing or malformed a warning is logged and
//! compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Environment variable naming a configuration file
pub const CONFIG_ENV_VAR: &str = "BGMIX_CONFIG";

/// Default background gain (matches the UI slider default)
pub const DEFAULT_GAIN: f32 = 0.5;

/// Default event channel capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Decoder implementation, chosen once when the pipeline is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecoderBackend {
    /// symphonia probe + codec registry (WAV, MP3, FLAC, AAC/M4A, Vorbis)
    #[default]
    Symphonia,
    /// hound reader, uncompressed WAV only
    PcmWav,
}

impl fmt::Display for DecoderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoderBackend::Symphonia => write!(f, "symphonia"),
            DecoderBackend::PcmWav => write!(f, "pcm-wav"),
        }
    }
}

impl FromStr for DecoderBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "symphonia" => Ok(DecoderBackend::Symphonia),
            "pcm-wav" | "pcm_wav" | "wav" => Ok(DecoderBackend::PcmWav),
            other => Err(Error::InvalidInput(format!(
                "Unknown decoder backend '{}' (expected 'symphonia' or 'pcm-wav')",
                other
            ))),
        }
    }
}

/// Output duration option
///
/// `Auto` keeps the full length of the main track. `Seconds` trims the main
/// track when it is longer than the given value; non-positive values behave
/// like `Auto`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawDuration", into = "RawDuration")]
pub enum DurationSetting {
    #[default]
    Auto,
    Seconds(f64),
}

impl DurationSetting {
    /// Target duration in seconds, or `None` for `Auto`
    pub fn as_seconds(&self) -> Option<f64> {
        match self {
            DurationSetting::Auto => None,
            DurationSetting::Seconds(secs) => Some(*secs),
        }
    }
}

impl fmt::Display for DurationSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationSetting::Auto => write!(f, "auto"),
            DurationSetting::Seconds(secs) => write!(f, "{}s", secs),
        }
    }
}

impl FromStr for DurationSetting {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(DurationSetting::Auto);
        }

        let secs: f64 = trimmed
            .trim_end_matches('s')
            .parse()
            .map_err(|_| Error::InvalidInput(format!("Invalid duration '{}'", s)))?;

        DurationSetting::try_from(RawDuration::Number(secs))
    }
}

/// Wire form of `DurationSetting`: either a number or a string
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Number(f64),
    Text(String),
}

impl TryFrom<RawDuration> for DurationSetting {
    type Error = Error;

    fn try_from(raw: RawDuration) -> Result<Self> {
        match raw {
            RawDuration::Number(secs) if secs.is_finite() => Ok(DurationSetting::Seconds(secs)),
            RawDuration::Number(secs) => Err(Error::InvalidInput(format!(
                "Duration must be finite, got {}",
                secs
            ))),
            RawDuration::Text(text) => text.parse(),
        }
    }
}

impl From<DurationSetting> for RawDuration {
    fn from(setting: DurationSetting) -> Self {
        match setting {
            DurationSetting::Auto => RawDuration::Text("auto".to_string()),
            DurationSetting::Seconds(secs) => RawDuration::Number(secs),
        }
    }
}

/// `[mix]` section: defaults for a mix request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixDefaults {
    /// Gain applied to the background track
    pub gain: f32,
    /// Output duration option
    pub duration: DurationSetting,
    /// Decoder backend
    pub decoder: DecoderBackend,
}

impl Default for MixDefaults {
    fn default() -> Self {
        Self {
            gain: DEFAULT_GAIN,
            duration: DurationSetting::Auto,
            decoder: DecoderBackend::Symphonia,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing filter level (e.g. "info", "debug")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[events]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast channel capacity for progress events
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Complete TOML configuration file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub mix: MixDefaults,
    pub logging: LoggingConfig,
    pub events: EventsConfig,
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserFile(PathBuf),
    Defaults,
}

impl TomlConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve configuration following the priority order in the module docs
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        // Priority 1: Command-line argument
        if let Some(path) = explicit {
            let config = Self::load_file(path)?;
            return Ok((config, ConfigSource::CommandLine(path.to_path_buf())));
        }

        // Priority 2: Environment variable
        if let Ok(value) = std::env::var(CONFIG_ENV_VAR) {
            if !value.trim().is_empty() {
                let path = PathBuf::from(value);
                let config = Self::load_file(&path)?;
                return Ok((config, ConfigSource::Environment(path)));
            }
        }

        // Priority 3: User config file
        if let Some(path) = default_config_path() {
            if path.exists() {
                match Self::load_file(&path) {
                    Ok(config) => return Ok((config, ConfigSource::UserFile(path))),
                    Err(e) => {
                        warn!("Ignoring config file {}: {}; using defaults", path.display(), e);
                    }
                }
            } else {
                debug!("No config file at {}", path.display());
            }
        }

        // Priority 4: Compiled defaults
        Ok((Self::default(), ConfigSource::Defaults))
    }

    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if !self.mix.gain.is_finite() {
            return Err(Error::Config(format!(
                "mix.gain must be finite, got {}",
                self.mix.gain
            )));
        }
        if self.events.capacity == 0 {
            return Err(Error::Config("events.capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// User config file location for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bgmix").join("config.toml"))
}
