//! Inbound event envelope shapes.
//!
//! The pipeline streams two kinds of envelope:
//!
//! - Custom-kind: `{"kind":"custom","nodeId":...,"message":...}` or
//!   `{"kind":"custom","type":"progress_update","message":...}`.
//! - Update-kind: an object whose sole key is a node identity and whose
//!   value is that node's state-update map.
//!
//! Everything here is deserialization shape only; interpretation lives in
//! the classifier.

use serde::Deserialize;
use serde_json::Value;

/// A custom-kind envelope, dispatched by node identity or update type.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomEnvelope {
    #[serde(default, rename = "nodeId")]
    pub node_id: Option<String>,

    #[serde(default, rename = "type")]
    pub update_type: Option<CustomUpdateType>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Update type for custom-kind envelopes that carry no node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomUpdateType {
    ProgressUpdate,
    ErrorOccurred,
    StatusChange,
}

/// A gathered source reference.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A message payload embedded in a node update (terminal nodes carry the
/// final answer here).
#[derive(Debug, Clone, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub content: String,
}

/// State-update map emitted by a pipeline node.
///
/// All fields are optional; each node populates its own slice of the
/// shared pipeline state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeUpdate {
    #[serde(default)]
    pub search_query: Vec<String>,

    #[serde(default)]
    pub sources_gathered: Vec<Source>,

    #[serde(default)]
    pub web_research_result: Vec<String>,

    #[serde(default)]
    pub is_sufficient: Option<bool>,

    #[serde(default)]
    pub knowledge_gap: Option<String>,

    #[serde(default)]
    pub follow_up_queries: Vec<String>,

    #[serde(default)]
    pub messages: Vec<MessagePayload>,
}

/// The two admissible envelope shapes, recognized from raw JSON.
#[derive(Debug)]
pub enum Envelope {
    Custom(CustomEnvelope),
    Update { node_id: String, update: NodeUpdate },
}

impl Envelope {
    /// Recognize an envelope from a raw value.
    ///
    /// Returns `None` when the value is not an object or matches neither
    /// shape; the caller turns that into a degraded entry.
    pub fn recognize(raw: &Value) -> Option<Envelope> {
        let object = raw.as_object()?;

        if object.get("kind").and_then(Value::as_str) == Some("custom") {
            let custom: CustomEnvelope = serde_json::from_value(raw.clone()).ok()?;
            return Some(Envelope::Custom(custom));
        }

        // Update-kind: the sole key is the node identity.
        if object.len() == 1 {
            let (node_id, payload) = object.iter().next()?;
            if payload.is_object() {
                let update: NodeUpdate =
                    serde_json::from_value(payload.clone()).unwrap_or_default();
                return Some(Envelope::Update {
                    node_id: node_id.clone(),
                    update,
                });
            }
        }

        None
    }
}
