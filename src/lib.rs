//! # qiraa-rs
//!
//! A Rust library for narrating Modern Standard Arabic through a hosted
//! text-to-speech model, with the audio pipeline needed to play and export
//! the result.
//!
//! ## Features
//!
//! - **Audio pipeline**: base64 → 16-bit PCM → normalized `f32` buffer, and PCM → WAV
//! - **Remote services**: speech synthesis and automatic tashkeel (`gemini` feature, default)
//! - **Playback**: local audio output through the default device (`playback` feature)
//! - **Session state**: input text, diacritic editing, credential storage and history
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! qiraa-rs = { version = "2026.10", features = ["playback"] }
//! ```
//!
//! ```ignore
//! use qiraa_rs::service::gemini::{GeminiClient, GeminiSettingsBuilder};
//! use qiraa_rs::audio::{decode_base64, encode_wav};
//! use qiraa_rs::{ArabicVoice, SpeechService};
//!
//! let settings = GeminiSettingsBuilder::default().api_key("my-key").build()?;
//! let client = GeminiClient::new(settings)?;
//!
//! let payload = client.synthesize("السَّلامُ عَلَيْكُمْ", ArabicVoice::Charon)?;
//! let wav = encode_wav(&decode_base64(&payload)?);
//! wav.write_to(std::path::Path::new("salam.wav"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audio;
pub mod config;
pub mod credentials;
pub mod history;
pub mod service;
pub mod session;
pub mod text;
pub mod voices;

use uuid::Uuid;

pub use config::Config;
pub use history::{AudioSnippet, History};
pub use service::{ServiceError, SpeechService};
pub use session::Session;
pub use voices::ArabicVoice;

/// Any failure surfaced by the crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Audio(#[from] audio::AudioError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[cfg(feature = "playback")]
    #[error(transparent)]
    Playback(#[from] audio::PlaybackError),
    #[error(transparent)]
    Credential(#[from] credentials::CredentialError),
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No history entry with id {0}")]
    SnippetNotFound(Uuid),
}

impl Error {
    /// One-line message suitable for an error banner.
    pub fn user_message(&self) -> String {
        match self {
            Error::Audio(_) => "Could not play or download audio.".to_string(),
            Error::Service(ServiceError::MissingCredential) => {
                "Please enter your Gemini API Key first.".to_string()
            }
            Error::Service(e) => {
                format!("{e}. Please check your API Key and try again.")
            }
            #[cfg(feature = "playback")]
            Error::Playback(_) => "Could not play audio. Try again.".to_string(),
            Error::Credential(e) => format!("Could not access the stored API Key: {e}"),
            Error::Config(e) => e.to_string(),
            Error::Io(_) => "Could not download audio.".to_string(),
            Error::SnippetNotFound(_) => "That recording is no longer available.".to_string(),
        }
    }
}
