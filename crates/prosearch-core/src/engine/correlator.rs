//! The turn correlator.
//!
//! Owns every piece of engine state and is its only writer: the
//! transcript, the live activity timeline, the committed history, the
//! terminal latch, and the turn state. Reacts to discrete inputs (a
//! submission, one raw event, stream-idle, a transport error,
//! cancellation) and publishes an immutable snapshot after each one.

use serde_json::Value;
use tokio::sync::{mpsc, watch};

use crate::conversation::{ConversationStore, Message, Role};
use crate::engine::snapshot::{EngineSnapshot, SnapshotPublisher};
use crate::engine::state::TurnState;
use crate::error::{EngineError, ErrorSink, TransportError};
use crate::pipeline::activity::{ActivityEvent, ActivityTimeline, HistoricalActivities};
use crate::pipeline::classifier::classify;
use crate::transport::{Effort, ResearchTransport, SubmitRequest, TransportSignal};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model the backend uses for reflection and answer synthesis.
    pub reasoning_model: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reasoning_model: "gemini-2.5-flash".to_string(),
        }
    }
}

/// Correlates one turn's event stream with the transcript entry it
/// produces.
pub struct TurnCorrelator<T: ResearchTransport> {
    transport: T,
    config: EngineConfig,
    transcript: ConversationStore,
    timeline: ActivityTimeline,
    historical: HistoricalActivities,
    state: TurnState,
    /// One-shot latch: a terminal event was observed for the current turn.
    terminal_seen: bool,
    errors: ErrorSink,
    publisher: SnapshotPublisher,
}

impl<T: ResearchTransport> TurnCorrelator<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, EngineConfig::default())
    }

    pub fn with_config(transport: T, config: EngineConfig) -> Self {
        Self {
            transport,
            config,
            transcript: ConversationStore::new(),
            timeline: ActivityTimeline::new(),
            historical: HistoricalActivities::new(),
            state: TurnState::Idle,
            terminal_seen: false,
            errors: ErrorSink::new(),
            publisher: SnapshotPublisher::new(),
        }
    }

    // === Inputs ===

    /// Open a turn: append the human message, reset turn-scoped state, and
    /// forward the request to the transport.
    ///
    /// Valid from Idle and Errored (a fresh submit is the recovery path).
    /// Submitting over an in-flight turn stops the transport first.
    pub fn submit(
        &mut self,
        text: impl Into<String>,
        effort: Effort,
    ) -> Result<(), TransportError> {
        if self.state == TurnState::AwaitingResponse {
            log::debug!("submit while a turn is in flight; stopping transport");
            self.transport.stop();
        }

        self.errors.clear();
        self.timeline.clear();
        self.terminal_seen = false;
        self.transcript.push(Message::human(text));
        self.state = TurnState::AwaitingResponse;

        let request = SubmitRequest {
            messages: self.transcript.messages().to_vec(),
            initial_search_query_count: effort.initial_search_query_count(),
            max_research_loops: effort.max_research_loops(),
            reasoning_model: self.config.reasoning_model.clone(),
        };

        if let Err(error) = self.transport.submit(request) {
            self.errors.record(EngineError::Transport(error.clone()));
            self.state = TurnState::Errored;
            self.publish();
            return Err(error);
        }

        self.publish();
        Ok(())
    }

    /// Process one raw envelope from the transport, in arrival order.
    pub fn on_event(&mut self, raw: &Value) {
        if self.state != TurnState::AwaitingResponse {
            // Late events after cancel/idle still classify (so failures
            // stay visible in logs) but a closed turn commits nothing.
            let _ = classify(raw);
            log::debug!("dropping event outside an active turn");
            return;
        }

        let classification = classify(raw);

        if let Some(event) = classification.event {
            self.timeline.push(event.title, event.summary, event.degraded);
        }

        if classification.terminal {
            if self.terminal_seen {
                // Second terminal within one turn: no duplicate agent
                // message, no second history write.
                log::warn!("duplicate terminal event within a turn; ignoring");
            } else {
                self.terminal_seen = true;
                match classification.answer {
                    Some(answer) => self.transcript.push(Message::agent(answer)),
                    None => {
                        log::warn!("{}", EngineError::Protocol);
                    }
                }
            }
        }

        self.publish();
    }

    /// The transport's stream went idle; close the turn.
    ///
    /// With the terminal latch set and an agent message at the transcript
    /// tail, the live timeline is committed under that message's id.
    /// Without the latch (cancellation, stream cut short) nothing is
    /// associated and the timeline contents are discarded.
    pub fn on_stream_idle(&mut self) {
        if self.state != TurnState::AwaitingResponse {
            log::debug!("stream idle outside an active turn");
            return;
        }

        if self.terminal_seen {
            if let Some(last) = self.transcript.last() {
                if last.role == Role::Agent {
                    self.state = TurnState::Finalizing;
                    let id = last.id.clone();
                    self.historical.commit(id, self.timeline.freeze());
                }
            }
        }

        self.terminal_seen = false;
        self.state = TurnState::Idle;
        self.publish();
    }

    /// A transport failure. Terminal for the turn; no further events are
    /// processed until a fresh submit.
    pub fn on_error(&mut self, error: TransportError) {
        self.errors.record(EngineError::Transport(error));
        self.state = TurnState::Errored;
        self.publish();
    }

    /// Cancel the in-flight turn.
    ///
    /// Cooperative: asks the transport to stop emitting and returns to
    /// Idle. Committed transcript entries and history survive; cancelling
    /// never erases anything already published.
    pub fn cancel(&mut self) {
        self.transport.stop();
        self.terminal_seen = false;
        self.state = TurnState::Idle;
        self.publish();
    }

    /// Consume transport signals until the turn closes.
    ///
    /// The channel receive is the only suspension point and is
    /// cancellation-safe; abandoning the future mid-wait loses nothing.
    pub async fn drive(&mut self, rx: &mut mpsc::UnboundedReceiver<TransportSignal>) {
        while let Some(signal) = rx.recv().await {
            match signal {
                TransportSignal::Event(raw) => self.on_event(&raw),
                TransportSignal::Idle => {
                    self.on_stream_idle();
                    break;
                }
                TransportSignal::Error(error) => {
                    self.on_error(error);
                    break;
                }
            }
        }
    }

    // === Read-only views ===

    pub fn transcript(&self) -> &[Message] {
        self.transcript.messages()
    }

    pub fn live_activity(&self) -> &[ActivityEvent] {
        self.timeline.events()
    }

    pub fn historical(&self) -> &HistoricalActivities {
        &self.historical
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn last_error(&self) -> Option<&EngineError> {
        self.errors.last()
    }

    /// Subscribe for published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.publisher.subscribe()
    }

    fn publish(&self) {
        self.publisher.publish(EngineSnapshot {
            transcript: self.transcript.messages().to_vec(),
            live_activity: self.timeline.freeze(),
            historical: self.historical.clone(),
            turn_state: self.state,
            last_error: self.errors.last().map(|e| e.to_string()),
        });
    }
}
