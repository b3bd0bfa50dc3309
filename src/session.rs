//! Headless front-end state.
//!
//! [`Session`] holds what the narration screen shows: the input text, the
//! credential, the selected voice, busy flags, the error banner and the
//! history of generated snippets. Remote calls are split in two halves so they
//! can run off the caller's thread:
//!
//! 1. `begin_*` validates input and returns a [`PendingRequest`] stamped with a
//!    generation token.
//! 2. [`PendingRequest::run`] performs the blocking call and yields a
//!    [`Completed`] value (both are `Send`).
//! 3. [`Session::apply`] folds the result back in, but only if no newer
//!    request of the same kind was started (or the request cancelled) in the
//!    meantime. Late results of superseded requests are dropped.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::audio::{self, AudioBuffer, SAMPLE_RATE};
use crate::credentials::CredentialStore;
use crate::history::{AudioSnippet, History};
use crate::service::{ServiceError, SpeechService};
use crate::text::{self, Selection};
use crate::voices::ArabicVoice;
use crate::Error;

const MISSING_KEY_MESSAGE: &str = "Please enter your Gemini API Key first.";
const TASHKEEL_FAILED_MESSAGE: &str =
    "Could not add diacritics automatically. Please check your API Key and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Generate,
    Diacritize,
}

/// A validated remote request waiting to be run.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    token: u64,
    kind: RequestKind,
    text: String,
    voice: ArabicVoice,
}

impl PendingRequest {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Perform the blocking remote call.
    pub fn run(self, service: &dyn SpeechService) -> Completed {
        let outcome = match self.kind {
            RequestKind::Generate => service.synthesize(&self.text, self.voice),
            RequestKind::Diacritize => service.diacritize(&self.text),
        };
        Completed {
            request: self,
            outcome,
        }
    }
}

/// Result of a [`PendingRequest`], ready for [`Session::apply`].
#[derive(Debug)]
pub struct Completed {
    request: PendingRequest,
    outcome: Result<String, ServiceError>,
}

/// What [`Session::apply`] did with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// New snippet added at the head of history.
    Snippet(Uuid),
    /// Input text replaced with the diacritized version.
    Text,
    /// The request failed; the error banner is set.
    Failed,
    /// A newer request superseded this one; nothing changed.
    Stale,
}

pub struct Session {
    credentials: Box<dyn CredentialStore>,
    api_key: String,
    voice: ArabicVoice,
    text: String,
    history: History,
    error: Option<String>,
    generating: Option<u64>,
    fixing: Option<u64>,
    next_token: u64,
}

impl Session {
    /// Create a session, reading the stored credential.
    pub fn new(credentials: Box<dyn CredentialStore>) -> Result<Self, Error> {
        let api_key = credentials.load()?.unwrap_or_default();
        Ok(Self {
            credentials,
            api_key,
            voice: ArabicVoice::default(),
            text: String::new(),
            history: History::new(),
            error: None,
            generating: None,
            fixing: None,
            next_token: 0,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Update the credential and persist it.
    pub fn set_api_key(&mut self, key: impl Into<String>) -> Result<(), Error> {
        self.api_key = key.into();
        self.credentials.save(&self.api_key)?;
        Ok(())
    }

    pub fn voice(&self) -> ArabicVoice {
        self.voice
    }

    pub fn set_voice(&mut self, voice: ArabicVoice) {
        self.voice = voice;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn clear_text(&mut self) {
        self.text.clear();
    }

    /// Insert a diacritic over `selection`; returns the new cursor position.
    pub fn insert_diacritic(&mut self, selection: Selection, mark: char) -> usize {
        let (text, cursor) = text::insert_at(&self.text, selection, mark);
        self.text = text;
        cursor
    }

    /// Strip tashkeel from `selection`, or from everything if it is empty.
    pub fn remove_tashkeel(&mut self, selection: Selection) -> Selection {
        let (text, selection) = text::strip_tashkeel_in(&self.text, selection);
        self.text = text;
        selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn delete_snippet(&mut self, id: Uuid) -> bool {
        self.history.remove(id)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Current error banner, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn is_generating(&self) -> bool {
        self.generating.is_some()
    }

    pub fn is_fixing(&self) -> bool {
        self.fixing.is_some()
    }

    fn slot(&mut self, kind: RequestKind) -> &mut Option<u64> {
        match kind {
            RequestKind::Generate => &mut self.generating,
            RequestKind::Diacritize => &mut self.fixing,
        }
    }

    fn begin(&mut self, kind: RequestKind) -> Option<PendingRequest> {
        if self.api_key.trim().is_empty() {
            self.error = Some(MISSING_KEY_MESSAGE.to_string());
            return None;
        }
        if self.text.trim().is_empty() {
            return None;
        }

        self.next_token += 1;
        let token = self.next_token;
        if let Some(previous) = self.slot(kind).replace(token) {
            log::debug!("{kind:?} request {previous} superseded by {token}");
        }
        self.error = None;

        Some(PendingRequest {
            token,
            kind,
            text: self.text.clone(),
            voice: self.voice,
        })
    }

    /// Start a narration request for the current text.
    ///
    /// Returns `None` when the text is blank or the credential is missing (the
    /// latter also sets the error banner).
    pub fn begin_generate(&mut self) -> Option<PendingRequest> {
        self.begin(RequestKind::Generate)
    }

    /// Start an automatic tashkeel request for the current text.
    pub fn begin_fix_text(&mut self) -> Option<PendingRequest> {
        self.begin(RequestKind::Diacritize)
    }

    /// Abandon the in-flight request of `kind`; its result will be ignored.
    pub fn cancel(&mut self, kind: RequestKind) {
        if let Some(token) = self.slot(kind).take() {
            log::debug!("{kind:?} request {token} cancelled");
        }
    }

    /// Fold a finished request back into the session.
    pub fn apply(&mut self, completed: Completed) -> Applied {
        let Completed { request, outcome } = completed;
        let slot = self.slot(request.kind);
        if *slot != Some(request.token) {
            log::warn!(
                "Ignoring stale {:?} result for request {}",
                request.kind,
                request.token
            );
            return Applied::Stale;
        }
        *slot = None;

        match (request.kind, outcome) {
            (RequestKind::Generate, Ok(audio_data)) => {
                // Reject payloads that could never be played before they reach history.
                let checked = audio::decode_base64(&audio_data)
                    .and_then(|bytes| audio::decode_audio(&bytes, SAMPLE_RATE))
                    .map_err(Error::from)
                    .and_then(|buffer| {
                        if buffer.is_empty() {
                            Err(ServiceError::EmptyResult("audio").into())
                        } else {
                            Ok(())
                        }
                    });
                if let Err(e) = checked {
                    log::error!("Service returned unusable audio: {e}");
                    self.error = Some(e.user_message());
                    return Applied::Failed;
                }
                let snippet = AudioSnippet::new(request.text, request.voice, audio_data);
                let id = snippet.id;
                log::info!("Added narration {id} to history");
                self.history.push(snippet);
                Applied::Snippet(id)
            }
            (RequestKind::Diacritize, Ok(text)) => {
                self.text = text;
                Applied::Text
            }
            (RequestKind::Generate, Err(e)) => {
                log::error!("Speech generation failed: {e}");
                self.error = Some(Error::from(e).user_message());
                Applied::Failed
            }
            (RequestKind::Diacritize, Err(e)) => {
                log::error!("Tashkeel failed: {e}");
                self.error = Some(match e {
                    ServiceError::MissingCredential => MISSING_KEY_MESSAGE.to_string(),
                    _ => TASHKEEL_FAILED_MESSAGE.to_string(),
                });
                Applied::Failed
            }
        }
    }

    /// Narrate the current text on the calling thread.
    pub fn generate(&mut self, service: &dyn SpeechService) -> Option<Applied> {
        let pending = self.begin_generate()?;
        Some(self.apply(pending.run(service)))
    }

    /// Diacritize the current text on the calling thread.
    pub fn fix_text(&mut self, service: &dyn SpeechService) -> Option<Applied> {
        let pending = self.begin_fix_text()?;
        Some(self.apply(pending.run(service)))
    }

    fn report<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(e) = &result {
            log::error!("{e}");
            self.error = Some(e.user_message());
        }
        result
    }

    fn snippet(&self, id: Uuid) -> Result<&AudioSnippet, Error> {
        self.history.get(id).ok_or(Error::SnippetNotFound(id))
    }

    /// Decode a history entry into a playable buffer.
    pub fn decode_snippet(&mut self, id: Uuid) -> Result<AudioBuffer, Error> {
        let result = self.snippet(id).and_then(|s| {
            let bytes = audio::decode_base64(&s.audio_data)?;
            Ok(audio::decode_audio(&bytes, SAMPLE_RATE)?)
        });
        self.report(result)
    }

    /// Write a history entry to `dir` as `qiraa-narration-<epoch-millis>.wav`.
    pub fn export_snippet(&mut self, id: Uuid, dir: &Path) -> Result<PathBuf, Error> {
        let result = self.snippet(id).and_then(|s| {
            let bytes = audio::decode_base64(&s.audio_data)?;
            let wav = audio::encode_wav(&bytes);
            let path = dir.join(audio::export_file_name(
                chrono::Utc::now().timestamp_millis(),
            ));
            wav.write_to(&path)?;
            Ok(path)
        });
        self.report(result)
    }

    /// Decode and start playing a history entry.
    #[cfg(feature = "playback")]
    pub fn play_snippet(
        &mut self,
        id: Uuid,
        output: &mut audio::AudioOutput,
    ) -> Result<audio::Playback, Error> {
        let buffer = self.decode_snippet(id)?;
        let result = output.play(&buffer).map_err(Error::from);
        self.report(result)
    }
}
