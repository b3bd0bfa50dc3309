use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::voices::ArabicVoice;

/// Default base URL of the generative language API.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Model used for speech synthesis.
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
/// Model used for automatic tashkeel.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";

/// Application settings, loaded from a TOML file.
///
/// Every field has a default, so a partial file (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub tts_model: String,
    pub text_model: String,
    pub voice: ArabicVoice,
    /// Request timeout for remote calls, in seconds
    pub timeout_secs: u64,
    /// Where exported WAV files are written
    pub output_dir: PathBuf,
    /// TOML file holding the stored credential
    pub credential_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            voice: ArabicVoice::default(),
            timeout_secs: 120,
            output_dir: PathBuf::from("."),
            credential_file: PathBuf::from("qiraa-credentials.toml"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
