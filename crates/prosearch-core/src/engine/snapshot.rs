//! Snapshot publishing for read-only observers.
//!
//! After every processed event or transition the correlator publishes an
//! immutable copy of its state. Any number of observers hold a
//! [`tokio::sync::watch`] receiver and read the latest snapshot without
//! blocking or mutating correlator state; late subscribers simply see the
//! current one.

use serde::Serialize;
use tokio::sync::watch;

use crate::conversation::Message;
use crate::engine::state::TurnState;
use crate::pipeline::activity::{ActivityEvent, HistoricalActivities};

/// Immutable view of the engine, published after each transition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineSnapshot {
    /// Ordered transcript.
    pub transcript: Vec<Message>,

    /// Live timeline of the in-flight turn (empty when idle).
    pub live_activity: Vec<ActivityEvent>,

    /// Committed per-message activity snapshots.
    pub historical: HistoricalActivities,

    pub turn_state: TurnState,

    /// The turn's terminal failure, if any.
    pub last_error: Option<String>,
}

/// Single-producer snapshot channel.
pub struct SnapshotPublisher {
    sender: watch::Sender<EngineSnapshot>,
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(EngineSnapshot::default());
        Self { sender }
    }

    /// Replace the published snapshot. Never blocks, and stores the value
    /// even when no observer is currently subscribed, so late subscribers
    /// still see the current state.
    pub fn publish(&self, snapshot: EngineSnapshot) {
        self.sender.send_replace(snapshot);
    }

    /// Subscribe for the latest snapshot. Past snapshots are not replayed.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.sender.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}
