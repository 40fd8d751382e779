//! Transcript handling for the Sunroom session client.
//!
//! Two pieces live here:
//!
//! - [`Transcript`]: the capped list of chat lines shown to the user, fed by
//!   transcription segments. Interim segments are refined in place until the
//!   platform marks them final.
//! - [`TextStreamRegistry`]: per-topic handlers for text streams the platform
//!   delivers. Handlers are held by a [`StreamSubscription`] guard and are
//!   removed when it drops.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sunroom_transcript::{TextStreamRegistry, Transcript, TRANSCRIPTION_TOPIC};
//!
//! let registry = TextStreamRegistry::new();
//! let _subscription = registry.register(TRANSCRIPTION_TOPIC, move |stream| {
//!     transcript.lock().unwrap().apply(stream.to_entry("alice"));
//! })?;
//! ```

mod error;
mod store;
mod stream;

pub use error::TranscriptError;
pub use store::{ApplyOutcome, Transcript, DEFAULT_TRANSCRIPT_CAPACITY};
pub use stream::{
    StreamSubscription, TextStream, TextStreamRegistry, ATTR_SEGMENT_ID, ATTR_TRANSCRIPTION_FINAL,
    TRANSCRIPTION_TOPIC,
};
