use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use sunroom_types::{TranscriptEntry, TranscriptSource};
use tracing::{debug, warn};

use crate::error::TranscriptError;

/// Topic the platform uses for transcription text streams.
pub const TRANSCRIPTION_TOPIC: &str = "lk.transcription";

/// Stream attribute carrying the transcription segment id.
pub const ATTR_SEGMENT_ID: &str = "lk.segment_id";

/// Stream attribute carrying `"true"` once a segment is final.
pub const ATTR_TRANSCRIPTION_FINAL: &str = "lk.transcription_final";

/// A fully read text stream, as delivered by the platform client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStream {
    /// Stream id assigned by the sender.
    pub id: String,
    pub topic: String,
    /// Identity of the participant that opened the stream.
    pub sender_identity: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    pub text: String,
}

impl TextStream {
    pub fn new(
        id: impl Into<String>,
        topic: impl Into<String>,
        sender_identity: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            sender_identity: sender_identity.into(),
            attributes: HashMap::new(),
            text: text.into(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Segment id, falling back to the stream id.
    pub fn segment_id(&self) -> &str {
        self.attributes
            .get(ATTR_SEGMENT_ID)
            .map(String::as_str)
            .unwrap_or(&self.id)
    }

    /// Streams without a finality attribute are complete messages.
    pub fn is_final(&self) -> bool {
        self.attributes
            .get(ATTR_TRANSCRIPTION_FINAL)
            .map_or(true, |v| v.eq_ignore_ascii_case("true"))
    }

    /// Converts the stream into a transcript entry, attributing it to the
    /// local participant when the sender identity matches.
    pub fn to_entry(&self, local_identity: &str) -> TranscriptEntry {
        let source = if self.sender_identity == local_identity {
            TranscriptSource::Local
        } else {
            TranscriptSource::Remote(self.sender_identity.clone())
        };
        TranscriptEntry::new(self.segment_id(), source, self.text.clone(), self.is_final())
    }
}

type Handler = Arc<dyn Fn(&TextStream) + Send + Sync>;

/// A registered handler plus the id of the registration that installed it.
struct Registration {
    id: u64,
    handler: Handler,
}

/// Per-topic text stream handlers.
///
/// At most one handler per topic. Registration hands back a
/// [`StreamSubscription`] that unregisters the handler when dropped, so a
/// session that goes away cannot leave a stale callback behind.
#[derive(Clone, Default)]
pub struct TextStreamRegistry {
    handlers: Arc<Mutex<HashMap<String, Registration>>>,
    next_id: Arc<AtomicU64>,
}

impl fmt::Debug for TextStreamRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStreamRegistry")
            .field("topics", &self.topics())
            .finish()
    }
}

impl TextStreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Registration>> {
        match self.handlers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // Handlers run without the lock and every critical section is a
                // single map operation, so a panic cannot leave it half-updated.
                tracing::error!("text stream registry lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Registers `handler` for `topic`.
    pub fn register<F>(&self, topic: &str, handler: F) -> Result<StreamSubscription, TranscriptError>
    where
        F: Fn(&TextStream) + Send + Sync + 'static,
    {
        let mut handlers = self.lock();
        if handlers.contains_key(topic) {
            return Err(TranscriptError::AlreadyRegistered(topic.to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        handlers.insert(
            topic.to_string(),
            Registration {
                id,
                handler: Arc::new(handler),
            },
        );
        debug!(topic, id, "registered text stream handler");

        Ok(StreamSubscription {
            registry: self.clone(),
            topic: topic.to_string(),
            id,
        })
    }

    /// Removes the handler for `topic`.
    pub fn unregister(&self, topic: &str) -> Result<(), TranscriptError> {
        match self.lock().remove(topic) {
            Some(_) => {
                debug!(topic, "unregistered text stream handler");
                Ok(())
            }
            None => Err(TranscriptError::NotRegistered(topic.to_string())),
        }
    }

    /// Removes the handler for `topic` only if registration `id` installed it.
    fn release(&self, topic: &str, id: u64) -> Result<(), TranscriptError> {
        let mut handlers = self.lock();
        if !handlers.get(topic).is_some_and(|registration| registration.id == id) {
            return Err(TranscriptError::NotRegistered(topic.to_string()));
        }
        handlers.remove(topic);
        debug!(topic, id, "unregistered text stream handler");
        Ok(())
    }

    pub fn is_registered(&self, topic: &str) -> bool {
        self.lock().contains_key(topic)
    }

    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.lock().keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Runs the handler for the stream's topic. Returns `false` when no
    /// handler is registered.
    pub fn dispatch(&self, stream: &TextStream) -> bool {
        // Clone out so the handler runs without the lock held.
        let handler = self
            .lock()
            .get(&stream.topic)
            .map(|registration| registration.handler.clone());
        match handler {
            Some(handler) => {
                handler(stream);
                true
            }
            None => {
                debug!(topic = %stream.topic, stream_id = %stream.id, "no handler for text stream");
                false
            }
        }
    }
}

/// Keeps a text stream handler registered for as long as it lives.
#[must_use = "dropping the subscription unregisters the handler"]
pub struct StreamSubscription {
    registry: TextStreamRegistry,
    topic: String,
    id: u64,
}

impl StreamSubscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl fmt::Debug for StreamSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSubscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for StreamSubscription {
    fn drop(&mut self) {
        // A handler registered later under the same topic belongs to someone else.
        if let Err(e) = self.registry.release(&self.topic, self.id) {
            warn!(topic = %self.topic, "failed to unregister text stream handler: {}", e);
        }
    }
}
