//! Shared types for the Sunroom voice chat.
//!
//! This crate holds the wire types of the token endpoint and the view types
//! the session client renders: connection badge, microphone state and
//! transcript entries. Every other crate in the workspace depends on it for
//! cross-cutting definitions, and it depends on nothing internal.

pub mod transcript;

use serde::{Deserialize, Serialize};

pub use transcript::{TranscriptEntry, TranscriptSource};

/// Request body for `POST /api/token`.
///
/// Both fields are optional on the wire so that a missing field can be
/// reported as a validation error instead of a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    /// Name of the room to join.
    #[serde(default)]
    pub room: Option<String>,
    /// Participant identity and display name.
    #[serde(default)]
    pub username: Option<String>,
}

impl TokenRequest {
    pub fn new(room: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            room: Some(room.into()),
            username: Some(username.into()),
        }
    }

    /// Returns the room and username if both are present and non-empty.
    ///
    /// Values pass through untouched; whitespace is a valid name.
    pub fn validated(&self) -> Option<(&str, &str)> {
        let room = self.room.as_deref().filter(|r| !r.is_empty())?;
        let username = self.username.as_deref().filter(|u| !u.is_empty())?;
        Some((room, username))
    }
}

/// Response body for a successfully minted token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed LiveKit access token (JWT).
    pub token: String,
}

/// Error body returned by every failing API route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Connection state of the room, as reported by the platform client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    /// Text shown in the connection badge.
    pub fn badge_label(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting…",
            Self::Connected => "Connected",
            Self::Reconnecting => "Reconnecting…",
        }
    }

    /// Whether the room is usable for media and text streams.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// State of the local microphone track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MicrophoneState {
    #[default]
    Enabled,
    Muted,
}

impl MicrophoneState {
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Enabled => Self::Muted,
            Self::Muted => Self::Enabled,
        }
    }

    /// Label for the mute control.
    pub fn control_label(self) -> &'static str {
        match self {
            Self::Enabled => "Mute",
            Self::Muted => "Unmute",
        }
    }
}
