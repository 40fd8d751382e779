//! Error types for transcript handling.

/// Errors raised by the transcript store and the text-stream registry.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    /// A transcript cannot hold zero entries.
    #[error("transcript capacity must be at least 1")]
    ZeroCapacity,

    /// A handler is already registered for the topic.
    #[error("text stream handler already registered for topic '{0}'")]
    AlreadyRegistered(String),

    /// No handler is registered for the topic.
    #[error("no text stream handler registered for topic '{0}'")]
    NotRegistered(String),
}
