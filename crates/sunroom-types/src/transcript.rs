//! Transcript entry definitions.
//!
//! A `TranscriptEntry` is one segment of transcribed speech as it appears in
//! the chat view. Entries are view-state only: they are built from text
//! streams the platform delivers and are dropped on disconnect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a transcript segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "identity")]
pub enum TranscriptSource {
    /// The participant running this client.
    Local,
    /// Another participant, identified by its room identity.
    Remote(String),
}

impl TranscriptSource {
    /// Display label for the chat view.
    pub fn label(&self) -> &str {
        match self {
            Self::Local => "You",
            Self::Remote(identity) if identity.starts_with("agent") => "Agent",
            Self::Remote(identity) => identity,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

/// One line of the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Segment identifier. Interim updates of a segment share it.
    pub id: String,
    pub source: TranscriptSource,
    pub text: String,
    /// Time the segment was received.
    pub timestamp: DateTime<Utc>,
    /// Whether the platform marked the segment as final.
    pub is_final: bool,
}

impl TranscriptEntry {
    pub fn new(
        id: impl Into<String>,
        source: TranscriptSource,
        text: impl Into<String>,
        is_final: bool,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            text: text.into(),
            timestamp: Utc::now(),
            is_final,
        }
    }
}
