use sunroom_transcript::TranscriptError;
use thiserror::Error;

/// Errors reported by the room client library.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("room error: {0}")]
    Room(String),

    #[error("not connected to a room")]
    NotConnected,
}

/// Errors that stop a session from being joined.
///
/// Every variant is meant to be shown to the user as a blocking alert; see
/// [`JoinError::alert_message`].
#[derive(Error, Debug)]
pub enum JoinError {
    #[error("invalid join options: {0}")]
    InvalidOptions(String),

    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("failed to connect to room: {0}")]
    Connect(#[source] ClientError),

    #[error("transcript setup failed: {0}")]
    Transcript(#[from] TranscriptError),
}

impl JoinError {
    /// Text for the alert shown when joining fails.
    pub fn alert_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => format!("Failed to get access token: {}", message),
            Self::Http(_) => "Failed to get access token: the token server is unreachable".to_string(),
            other => format!("Failed to join the room: {}", other),
        }
    }
}
