//! Engine error taxonomy and the error sink.

use thiserror::Error;

/// Failure while talking to the research backend. Turn-fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to reach research backend: {0}")]
    Connection(String),

    #[error("stream aborted: {0}")]
    Aborted(String),
}

/// Everything that can go wrong inside the engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Backend/connection failure. Surfaced verbatim; a fresh submit is
    /// required to recover.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A single malformed envelope. Isolated to one event; the turn
    /// continues.
    #[error("unclassifiable event: {0}")]
    Classification(String),

    /// Terminal event arrived without answer content. No transcript
    /// append; the turn still closes on stream-idle.
    #[error("terminal event carried no answer content")]
    Protocol,
}

/// Collects the turn's terminal failure, if any.
///
/// Classification errors never land here; they stay visible inline as
/// degraded timeline entries. Transport errors always do.
#[derive(Debug, Default)]
pub struct ErrorSink {
    last: Option<EngineError>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a turn-fatal error, replacing any previous one.
    pub fn record(&mut self, error: EngineError) {
        log::warn!("engine error: {}", error);
        self.last = Some(error);
    }

    pub fn last(&self) -> Option<&EngineError> {
        self.last.as_ref()
    }

    /// Clear the recorded error (a fresh submit starts clean).
    pub fn clear(&mut self) {
        self.last = None;
    }
}
