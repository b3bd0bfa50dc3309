//! Remote speech and text services.
//!
//! Synthesis and diacritization are delegated to a hosted model. This module
//! defines the [`SpeechService`] seam; implementations are enabled via Cargo
//! features:
//! - `gemini` - Gemini `generateContent` API over HTTPS (default)

#[cfg(feature = "gemini")]
pub mod gemini;

use crate::voices::ArabicVoice;

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("API key is missing")]
    MissingCredential,
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Failed to parse service response: {0}")]
    InvalidResponse(String),
    #[error("Service returned no {0}")]
    EmptyResult(&'static str),
}

/// Common interface for the remote narration backend.
///
/// Calls block until the service answers. Implementations must be shareable
/// across threads so requests can run off the caller's thread.
pub trait SpeechService: Send + Sync {
    /// Synthesize `text` with `voice`.
    ///
    /// Returns base64 of raw 16-bit little-endian mono PCM at 24 kHz.
    fn synthesize(&self, text: &str, voice: ArabicVoice) -> Result<String, ServiceError>;

    /// Return `text` with full tashkeel added.
    fn diacritize(&self, text: &str) -> Result<String, ServiceError>;
}

impl<T: SpeechService + ?Sized> SpeechService for &T {
    fn synthesize(&self, text: &str, voice: ArabicVoice) -> Result<String, ServiceError> {
        (**self).synthesize(text, voice)
    }

    fn diacritize(&self, text: &str) -> Result<String, ServiceError> {
        (**self).diacritize(text)
    }
}
