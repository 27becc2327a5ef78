//! # prosearch-core
//!
//! Client-side stream correlation engine for a multi-stage research
//! pipeline. One conversational turn (query → search/reflect loop → final
//! answer) arrives as a heterogeneous stream of progress events; the
//! engine turns it into two coherent artifacts:
//!
//! - an ordered conversation transcript, and
//! - a per-turn activity timeline, permanently associated with the
//!   transcript entry it explains.
//!
//! This crate is framework-agnostic. It owns no connection and renders
//! nothing: the transport is a trait at the boundary, and observers read
//! immutable published snapshots.
//!
//! ## Key Concepts
//!
//! - **Turn**: one submission through to a committed terminal event,
//!   cancellation, or error.
//! - **Classification**: raw envelope → normalized timeline entry;
//!   failures degrade, they never propagate.
//! - **Snapshot commit**: freezing the live timeline under the finalized
//!   agent message's id.

pub mod conversation;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod transport;

// Re-export commonly used types
pub use conversation::{ConversationStore, Message, MessageId, Role};
pub use engine::correlator::{EngineConfig, TurnCorrelator};
pub use engine::snapshot::EngineSnapshot;
pub use engine::state::TurnState;
pub use error::{EngineError, TransportError};
pub use pipeline::activity::{ActivityEvent, ActivityTimeline, HistoricalActivities};
pub use pipeline::classifier::{classify, Classification};
pub use transport::{Effort, ResearchTransport, SubmitRequest, TransportSignal};
