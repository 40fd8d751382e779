use std::collections::VecDeque;

use sunroom_types::TranscriptEntry;

use crate::error::TranscriptError;

/// Default number of entries kept in the chat view.
pub const DEFAULT_TRANSCRIPT_CAPACITY: usize = 100;

/// What [`Transcript::apply`] did with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The entry was added at the end.
    Appended,
    /// The entry replaced an interim segment with the same id.
    Updated,
}

/// Capped, in-memory chat transcript.
///
/// Entries are kept in arrival order. Interim segments are rewritten in place
/// as the platform refines them; once a segment is final it is never
/// touched again. When an append pushes the length past the capacity the
/// oldest entries are evicted.
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: VecDeque<TranscriptEntry>,
    capacity: usize,
}

impl Transcript {
    pub fn new(capacity: usize) -> Result<Self, TranscriptError> {
        if capacity == 0 {
            return Err(TranscriptError::ZeroCapacity);
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_TRANSCRIPT_CAPACITY)),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter()
    }

    /// Copies the entries out, oldest first.
    pub fn to_vec(&self) -> Vec<TranscriptEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Adds a segment, or refines the interim segment it continues.
    pub fn apply(&mut self, entry: TranscriptEntry) -> ApplyOutcome {
        let interim = self
            .entries
            .iter_mut()
            .rev()
            .find(|e| e.id == entry.id && e.source == entry.source);

        if let Some(existing) = interim {
            if !existing.is_final {
                existing.text = entry.text;
                existing.is_final = entry.is_final;
                existing.timestamp = entry.timestamp;
                return ApplyOutcome::Updated;
            }
        }

        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        ApplyOutcome::Appended
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// True while the newest remote segment is still interim.
    pub fn is_remote_typing(&self) -> bool {
        self.entries
            .iter()
            .rev()
            .find(|e| !e.source.is_local())
            .is_some_and(|e| !e.is_final)
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: DEFAULT_TRANSCRIPT_CAPACITY,
        }
    }
}
