//! Transport boundary.
//!
//! The engine never talks to the backend directly. It hands a
//! [`SubmitRequest`] to a [`ResearchTransport`] when a turn opens, asks it
//! to stop on cancellation, and receives the pipeline's progress stream
//! back as [`TransportSignal`]s.

use serde::{Deserialize, Serialize};

use crate::conversation::Message;
use crate::error::TransportError;

/// How much research the backend should spend on a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    /// Number of search queries the pipeline generates up front.
    pub fn initial_search_query_count(self) -> u32 {
        match self {
            Effort::Low => 1,
            Effort::Medium => 3,
            Effort::High => 5,
        }
    }

    /// Maximum number of search/reflect loops before the answer is forced.
    pub fn max_research_loops(self) -> u32 {
        match self {
            Effort::Low => 1,
            Effort::Medium => 3,
            Effort::High => 10,
        }
    }
}

/// Request forwarded to the backend when a turn opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Prior transcript plus the new human message, in order.
    pub messages: Vec<Message>,
    pub initial_search_query_count: u32,
    pub max_research_loops: u32,
    pub reasoning_model: String,
}

/// Outbound contract to the backend connection.
///
/// Implementations own connection setup and streaming; the engine only
/// cares that a submitted request starts a stream and that `stop` asks the
/// in-flight run to cease emitting.
pub trait ResearchTransport {
    fn submit(&mut self, request: SubmitRequest) -> Result<(), TransportError>;

    /// Request the in-flight turn to stop. Cooperative: events already in
    /// flight may still arrive after this returns.
    fn stop(&mut self);
}

/// Inbound signal from the transport's stream.
#[derive(Debug)]
pub enum TransportSignal {
    /// A raw event envelope from the pipeline.
    Event(serde_json::Value),

    /// The stream went idle; no further events will arrive for this turn.
    Idle,

    /// The stream failed. Terminal for the turn.
    Error(TransportError),
}
