//! Activity timeline containers.
//!
//! An [`ActivityEvent`] is one entry in the per-turn processing timeline.
//! The live timeline is turn-scoped: born at submission, grown while the
//! turn is in flight, frozen into [`HistoricalActivities`] when the turn
//! finalizes, then cleared by the next submission.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::MessageId;

/// One entry in a turn's activity timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Position within the owning turn. Strictly monotonic; ordering never
    /// depends on the wall-clock timestamp alone.
    pub seq: u64,

    /// Short label for the processing step.
    pub title: String,

    /// Bounded-length human-readable summary.
    pub summary: String,

    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,

    /// True when the entry stands in for an event that failed to classify.
    #[serde(default)]
    pub degraded: bool,
}

/// Ordered per-turn buffer of activity events (the accumulator).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityTimeline {
    events: Vec<ActivityEvent>,
    next_seq: u64,
}

impl ActivityTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, assigning its seq and timestamp.
    pub fn push(&mut self, title: String, summary: String, degraded: bool) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(ActivityEvent {
            seq,
            title,
            summary,
            timestamp: Utc::now(),
            degraded,
        });
    }

    pub fn events(&self) -> &[ActivityEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop all entries and restart the seq counter for a new turn.
    pub fn clear(&mut self) {
        self.events.clear();
        self.next_seq = 0;
    }

    /// Immutable copy of the current contents, for snapshot commit.
    pub fn freeze(&self) -> Vec<ActivityEvent> {
        self.events.clone()
    }
}

/// Write-once map from a finalized agent message to the timeline that
/// produced it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoricalActivities {
    entries: HashMap<MessageId, Vec<ActivityEvent>>,
}

impl HistoricalActivities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a frozen timeline under a message id.
    ///
    /// Returns `false` and leaves the existing snapshot untouched when the
    /// key is already present. Keys are never overwritten.
    pub fn commit(&mut self, id: MessageId, events: Vec<ActivityEvent>) -> bool {
        if self.entries.contains_key(&id) {
            log::warn!("refusing to overwrite activity snapshot for message {id}");
            return false;
        }
        self.entries.insert(id, events);
        true
    }

    pub fn get(&self, id: &MessageId) -> Option<&[ActivityEvent]> {
        self.entries.get(id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
