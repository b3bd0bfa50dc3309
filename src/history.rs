use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::voices::ArabicVoice;

/// One generated narration, kept so it can be replayed or exported later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSnippet {
    pub id: Uuid,
    pub text: String,
    pub voice: ArabicVoice,
    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Base64 of raw 16-bit mono PCM at 24 kHz, as returned by the service
    pub audio_data: String,
}

impl AudioSnippet {
    /// Create a snippet stamped with a fresh id and the current time.
    pub fn new(text: impl Into<String>, voice: ArabicVoice, audio_data: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            voice,
            timestamp: chrono::Utc::now().timestamp_millis(),
            audio_data,
        }
    }

    /// Local wall-clock time of creation, formatted `HH:MM`.
    pub fn time_label(&self) -> String {
        use chrono::TimeZone;
        chrono::Local
            .timestamp_millis_opt(self.timestamp)
            .single()
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default()
    }
}

/// Generated narrations, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    snippets: Vec<AudioSnippet>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a snippet at the head of the list.
    pub fn push(&mut self, snippet: AudioSnippet) {
        self.snippets.insert(0, snippet);
    }

    /// Remove the snippet with `id`. Returns whether one was removed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.snippets.len();
        self.snippets.retain(|s| s.id != id);
        before != self.snippets.len()
    }

    pub fn clear(&mut self) {
        self.snippets.clear();
    }

    pub fn get(&self, id: Uuid) -> Option<&AudioSnippet> {
        self.snippets.iter().find(|s| s.id == id)
    }

    /// Most recent snippet, if any.
    pub fn latest(&self) -> Option<&AudioSnippet> {
        self.snippets.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AudioSnippet> {
        self.snippets.iter()
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}
