use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prebuilt voices offered by the remote speech service.
///
/// Serialized by the exact name the service expects in
/// `prebuiltVoiceConfig.voiceName`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArabicVoice {
    Kore,
    Puck,
    #[default]
    Charon,
    Fenrir,
    Zephyr,
}

impl ArabicVoice {
    pub const ALL: [ArabicVoice; 5] = [
        ArabicVoice::Kore,
        ArabicVoice::Puck,
        ArabicVoice::Charon,
        ArabicVoice::Fenrir,
        ArabicVoice::Zephyr,
    ];

    /// Name sent to the service.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArabicVoice::Kore => "Kore",
            ArabicVoice::Puck => "Puck",
            ArabicVoice::Charon => "Charon",
            ArabicVoice::Fenrir => "Fenrir",
            ArabicVoice::Zephyr => "Zephyr",
        }
    }
}

impl fmt::Display for ArabicVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Voice '{0}' not found. Available voices: Kore, Puck, Charon, Fenrir, Zephyr")]
pub struct UnknownVoice(pub String);

impl FromStr for ArabicVoice {
    type Err = UnknownVoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownVoice(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{ArabicVoice, UnknownVoice};

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("charon".parse::<ArabicVoice>(), Ok(ArabicVoice::Charon));
        assert_eq!(" ZEPHYR ".parse::<ArabicVoice>(), Ok(ArabicVoice::Zephyr));
        assert_eq!(
            "alloy".parse::<ArabicVoice>(),
            Err(UnknownVoice("alloy".to_string()))
        );
    }

    #[test]
    fn serializes_as_service_name() {
        assert_eq!(serde_json::to_string(&ArabicVoice::Fenrir).unwrap(), "\"Fenrir\"");
        assert_eq!(ArabicVoice::default(), ArabicVoice::Charon);
    }
}
