//! Turn lifecycle state.

use serde::{Deserialize, Serialize};

/// Where the correlator is in the current turn.
///
/// The terminal latch is deliberately not part of this enum: a terminal
/// event does not close the turn by itself, the stream's idle signal does,
/// so the latch lives alongside the state rather than inside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnState {
    /// No turn in flight. Ready for a submission.
    #[default]
    Idle,

    /// A submission is out; pipeline events are being consumed.
    AwaitingResponse,

    /// Stream went idle after a terminal event; the timeline snapshot is
    /// being committed.
    Finalizing,

    /// The turn failed. A fresh submission is required to recover.
    Errored,
}
