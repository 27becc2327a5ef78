//! Event classification.
//!
//! Turns raw pipeline envelopes into normalized timeline entries. The
//! entry point is [`classify`], a pure function with one hard rule: it
//! never fails. Malformed envelopes and secondary parse failures become a
//! single degraded entry so classification problems stay visible without
//! aborting the turn.
//!
//! Dispatch is a closed table over node identities ([`NodeKind`]) with an
//! explicit unknown-node default.

use serde::Deserialize;
use serde_json::Value;

use super::envelope::{CustomEnvelope, CustomUpdateType, Envelope, NodeUpdate};

/// Maximum length of a synthesized summary.
pub const MAX_SUMMARY_CHARS: usize = 150;

/// Maximum length of an inline fragment (query preview, title list,
/// result excerpt) embedded in a summary.
pub const MAX_PREVIEW_CHARS: usize = 100;

/// A normalized timeline entry produced from one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub title: String,
    pub summary: String,
    /// True when the entry stands in for an envelope that failed to
    /// classify.
    pub degraded: bool,
}

/// Outcome of classifying one envelope.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Timeline entry, if the envelope produced one.
    pub event: Option<ClassifiedEvent>,

    /// The envelope signals that answer generation has completed.
    pub terminal: bool,

    /// Literal answer content carried by a terminal envelope.
    pub answer: Option<String>,
}

impl Classification {
    fn entry(title: impl Into<String>, summary: String) -> Self {
        Self {
            event: Some(ClassifiedEvent {
                title: title.into(),
                summary,
                degraded: false,
            }),
            ..Self::default()
        }
    }

    fn degraded(title: impl Into<String>, summary: String) -> Self {
        Self {
            event: Some(ClassifiedEvent {
                title: title.into(),
                summary,
                degraded: true,
            }),
            ..Self::default()
        }
    }
}

/// The pipeline's node identities. Closed set; everything else falls
/// through to [`NodeKind::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    GenerateQuery,
    WebResearch,
    DocResearch,
    Reflection,
    EvaluateProgress,
    FinalizeAnswer,
    Unknown(String),
}

impl NodeKind {
    fn from_id(id: &str) -> Self {
        match id {
            "generate_query" => NodeKind::GenerateQuery,
            "web_research" => NodeKind::WebResearch,
            "doc_research" => NodeKind::DocResearch,
            "reflection" => NodeKind::Reflection,
            "evaluate_progress" => NodeKind::EvaluateProgress,
            "finalize_answer" => NodeKind::FinalizeAnswer,
            other => NodeKind::Unknown(other.to_string()),
        }
    }

    fn title(&self) -> &str {
        match self {
            NodeKind::GenerateQuery => "Generating Search Queries",
            NodeKind::WebResearch => "Web Research",
            NodeKind::DocResearch => "Document Research",
            NodeKind::Reflection => "Reflection",
            NodeKind::EvaluateProgress => "Evaluating Progress",
            NodeKind::FinalizeAnswer => "Finalizing Answer",
            NodeKind::Unknown(id) => id,
        }
    }
}

/// Structured payload embedded in reflection events.
#[derive(Debug, Clone, Default, Deserialize)]
struct ReflectionPayload {
    #[serde(default)]
    is_sufficient: Option<bool>,
    #[serde(default)]
    knowledge_gap: Option<String>,
    #[serde(default)]
    follow_up_queries: Vec<String>,
}

/// Classify a raw envelope. Never panics, never returns an error.
pub fn classify(raw: &Value) -> Classification {
    match Envelope::recognize(raw) {
        Some(Envelope::Custom(custom)) => classify_custom(&custom),
        Some(Envelope::Update { node_id, update }) => {
            classify_update(&NodeKind::from_id(&node_id), &update, raw)
        }
        None => {
            log::warn!("unclassifiable envelope: {}", compact(raw));
            Classification::degraded(
                "Unrecognized Event",
                truncate(&compact(raw), MAX_SUMMARY_CHARS),
            )
        }
    }
}

fn classify_custom(custom: &CustomEnvelope) -> Classification {
    let message = custom.message.as_deref().unwrap_or("");

    if let Some(ref node_id) = custom.node_id {
        let kind = NodeKind::from_id(node_id);
        return match kind {
            NodeKind::Reflection => {
                Classification::entry(kind.title().to_string(), reflection_summary_from(message))
            }
            // Progress notification while the answer is being composed.
            // Termination itself is signaled by the node's state update,
            // which is what carries the answer content.
            NodeKind::FinalizeAnswer => {
                Classification::entry(kind.title().to_string(), finalize_summary())
            }
            _ => Classification::entry(
                kind.title().to_string(),
                truncate(message, MAX_SUMMARY_CHARS),
            ),
        };
    }

    match custom.update_type {
        Some(CustomUpdateType::ProgressUpdate) => {
            Classification::entry("Progress", truncate(message, MAX_SUMMARY_CHARS))
        }
        Some(CustomUpdateType::StatusChange) => {
            Classification::entry("Status", truncate(message, MAX_SUMMARY_CHARS))
        }
        Some(CustomUpdateType::ErrorOccurred) => {
            Classification::degraded("Error", truncate(message, MAX_SUMMARY_CHARS))
        }
        // Neither a node identity nor an update type.
        None => Classification::degraded("Unrecognized Event", truncate(message, MAX_SUMMARY_CHARS)),
    }
}

fn classify_update(kind: &NodeKind, update: &NodeUpdate, raw: &Value) -> Classification {
    match kind {
        NodeKind::GenerateQuery => {
            Classification::entry(kind.title().to_string(), query_summary(update))
        }

        NodeKind::WebResearch | NodeKind::DocResearch => {
            Classification::entry(kind.title().to_string(), research_summary(update))
        }

        NodeKind::Reflection => {
            Classification::entry(kind.title().to_string(), reflection_summary(update))
        }

        NodeKind::EvaluateProgress => Classification::entry(
            kind.title().to_string(),
            "Checking whether the gathered material covers the question".to_string(),
        ),

        // The answer lands in the transcript, not the timeline, so the
        // terminal update produces no entry of its own.
        NodeKind::FinalizeAnswer => Classification {
            event: None,
            terminal: true,
            answer: update
                .messages
                .iter()
                .rev()
                .map(|m| m.content.trim())
                .find(|c| !c.is_empty())
                .map(str::to_string),
        },

        NodeKind::Unknown(id) => {
            let payload = raw
                .get(id)
                .map(compact)
                .unwrap_or_else(|| compact(raw));
            Classification::entry(id.clone(), truncate(&payload, MAX_SUMMARY_CHARS))
        }
    }
}

fn query_summary(update: &NodeUpdate) -> String {
    let count = update.search_query.len();
    if count == 0 {
        return "Generated search queries".to_string();
    }
    let preview = truncate(&update.search_query.join(", "), MAX_PREVIEW_CHARS);
    format!("Generated {count} search queries: {preview}")
}

fn research_summary(update: &NodeUpdate) -> String {
    let count = update.sources_gathered.len();
    let titles: Vec<&str> = update
        .sources_gathered
        .iter()
        .filter_map(|s| s.title.as_deref())
        .collect();

    let mut summary = if titles.is_empty() {
        format!("Gathered {count} sources")
    } else {
        format!(
            "Gathered {count} sources: {}",
            truncate(&titles.join(", "), MAX_PREVIEW_CHARS)
        )
    };

    if let Some(excerpt) = update.web_research_result.first() {
        let excerpt = excerpt.trim();
        if !excerpt.is_empty() {
            summary.push_str(". ");
            summary.push_str(&truncate(excerpt, MAX_PREVIEW_CHARS));
        }
    }

    truncate(&summary, MAX_SUMMARY_CHARS)
}

fn reflection_summary(update: &NodeUpdate) -> String {
    let payload = ReflectionPayload {
        is_sufficient: update.is_sufficient,
        knowledge_gap: update.knowledge_gap.clone(),
        follow_up_queries: update.follow_up_queries.clone(),
    };
    synthesize_reflection(&payload)
        .unwrap_or_else(|| "Assessing the gathered research".to_string())
}

/// Reflection via a custom envelope carries its structured payload as
/// embedded JSON text; fall back to the raw text when parsing fails.
fn reflection_summary_from(message: &str) -> String {
    serde_json::from_str::<ReflectionPayload>(message)
        .ok()
        .and_then(|payload| synthesize_reflection(&payload))
        .unwrap_or_else(|| truncate(message, MAX_SUMMARY_CHARS))
}

/// Multi-part summary from whichever reflection fields are present.
/// Returns `None` when no field carries anything usable.
fn synthesize_reflection(payload: &ReflectionPayload) -> Option<String> {
    let mut parts = Vec::new();

    match payload.is_sufficient {
        Some(true) => parts.push("Research is sufficient".to_string()),
        Some(false) => parts.push("More research needed".to_string()),
        None => {}
    }

    if let Some(gap) = payload.knowledge_gap.as_deref() {
        let gap = gap.trim();
        if !gap.is_empty() {
            parts.push(format!("gap: {}", truncate(gap, MAX_PREVIEW_CHARS)));
        }
    }

    if !payload.follow_up_queries.is_empty() {
        parts.push(format!(
            "follow-ups: {}",
            truncate(&payload.follow_up_queries.join(", "), MAX_PREVIEW_CHARS)
        ));
    }

    if parts.is_empty() {
        None
    } else {
        Some(truncate(&parts.join("; "), MAX_SUMMARY_CHARS))
    }
}

fn finalize_summary() -> String {
    "Consolidating findings into the final answer".to_string()
}

/// Truncate to a maximum number of characters, appending an ellipsis
/// marker. Counts scalar values, never splits a char.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}…")
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod query_generation {
        use super::*;

        #[test]
        fn summarizes_count_and_preview() {
            let raw = json!({
                "generate_query": {"search_query": ["rust async streams", "tokio watch channel"]}
            });
            let classification = classify(&raw);
            let event = classification.event.unwrap();

            assert_eq!(event.title, "Generating Search Queries");
            assert!(event.summary.contains("2 search queries"));
            assert!(event.summary.contains("rust async streams"));
            assert!(!event.degraded);
            assert!(!classification.terminal);
        }

        #[test]
        fn empty_query_list_still_classifies() {
            let raw = json!({"generate_query": {}});
            let event = classify(&raw).event.unwrap();
            assert_eq!(event.summary, "Generated search queries");
        }

        #[test]
        fn long_query_preview_is_truncated() {
            let long = "q".repeat(300);
            let raw = json!({"generate_query": {"search_query": [long]}});
            let event = classify(&raw).event.unwrap();
            assert!(event.summary.contains('…'));
            assert!(event.summary.chars().count() <= MAX_SUMMARY_CHARS + 40);
        }
    }

    mod research {
        use super::*;

        #[test]
        fn summarizes_sources_and_excerpt() {
            let raw = json!({
                "web_research": {
                    "sources_gathered": [
                        {"title": "Tokio Docs", "url": "https://tokio.rs"},
                        {"title": "Rust Book", "url": "https://doc.rust-lang.org"},
                        {"title": "RFC 2394", "url": "https://rust-lang.github.io"}
                    ],
                    "web_research_result": ["Async/await landed in Rust 1.39."]
                }
            });
            let event = classify(&raw).event.unwrap();

            assert_eq!(event.title, "Web Research");
            assert!(event.summary.contains("3 sources"));
            assert!(event.summary.contains("Tokio Docs"));
            assert!(event.summary.contains("Async/await landed"));
        }

        #[test]
        fn doc_variant_uses_same_rule() {
            let raw = json!({
                "doc_research": {
                    "sources_gathered": [{"title": "Internal Handbook"}]
                }
            });
            let event = classify(&raw).event.unwrap();
            assert_eq!(event.title, "Document Research");
            assert!(event.summary.contains("1 sources"));
        }

        #[test]
        fn sources_without_titles_summarize_count_only() {
            let raw = json!({
                "web_research": {"sources_gathered": [{"url": "https://a"}, {"url": "https://b"}]}
            });
            let event = classify(&raw).event.unwrap();
            assert_eq!(event.summary, "Gathered 2 sources");
        }

        #[test]
        fn summary_is_bounded() {
            let raw = json!({
                "web_research": {
                    "sources_gathered": [{"title": "T".repeat(400)}],
                    "web_research_result": ["R".repeat(400)]
                }
            });
            let event = classify(&raw).event.unwrap();
            assert!(event.summary.chars().count() <= MAX_SUMMARY_CHARS + 1);
        }
    }

    mod reflection {
        use super::*;

        #[test]
        fn sufficient_with_no_gap() {
            let raw = json!({"reflection": {"is_sufficient": true}});
            let event = classify(&raw).event.unwrap();
            assert_eq!(event.title, "Reflection");
            assert_eq!(event.summary, "Research is sufficient");
        }

        #[test]
        fn insufficient_with_gap_and_follow_ups() {
            let raw = json!({
                "reflection": {
                    "is_sufficient": false,
                    "knowledge_gap": "no benchmark data",
                    "follow_up_queries": ["rust benchmark suite", "criterion crate"]
                }
            });
            let event = classify(&raw).event.unwrap();

            assert!(event.summary.contains("More research needed"));
            assert!(event.summary.contains("gap: no benchmark data"));
            assert!(event.summary.contains("follow-ups: rust benchmark suite"));
        }

        #[test]
        fn embedded_json_payload_is_parsed() {
            let raw = json!({
                "kind": "custom",
                "nodeId": "reflection",
                "message": "{\"is_sufficient\": false, \"knowledge_gap\": \"missing dates\"}"
            });
            let event = classify(&raw).event.unwrap();
            assert!(event.summary.contains("More research needed"));
            assert!(event.summary.contains("missing dates"));
        }

        #[test]
        fn unparseable_payload_falls_back_to_raw_text() {
            let raw = json!({
                "kind": "custom",
                "nodeId": "reflection",
                "message": "still thinking about coverage"
            });
            let event = classify(&raw).event.unwrap();
            assert_eq!(event.summary, "still thinking about coverage");
            assert!(!event.degraded);
        }

        #[test]
        fn empty_payload_gets_generic_summary() {
            let raw = json!({"reflection": {}});
            let event = classify(&raw).event.unwrap();
            assert_eq!(event.summary, "Assessing the gathered research");
        }
    }

    mod progress_evaluation {
        use super::*;

        #[test]
        fn fixed_descriptive_summary() {
            let raw = json!({"evaluate_progress": {}});
            let event = classify(&raw).event.unwrap();
            assert_eq!(event.title, "Evaluating Progress");
            assert!(event.summary.contains("gathered material"));
        }
    }

    mod finalize {
        use super::*;

        #[test]
        fn signals_terminal_and_propagates_answer() {
            let raw = json!({
                "finalize_answer": {
                    "messages": [{"content": "X is a stream correlation engine."}]
                }
            });
            let classification = classify(&raw);

            assert!(classification.terminal);
            assert_eq!(
                classification.answer.as_deref(),
                Some("X is a stream correlation engine.")
            );
            // The answer goes to the transcript; no timeline entry here.
            assert!(classification.event.is_none());
        }

        #[test]
        fn terminal_without_content_carries_no_answer() {
            let raw = json!({"finalize_answer": {}});
            let classification = classify(&raw);
            assert!(classification.terminal);
            assert!(classification.answer.is_none());
        }

        #[test]
        fn last_non_empty_message_wins() {
            let raw = json!({
                "finalize_answer": {
                    "messages": [
                        {"content": "draft"},
                        {"content": "Final answer."},
                        {"content": "  "}
                    ]
                }
            });
            let classification = classify(&raw);
            assert_eq!(classification.answer.as_deref(), Some("Final answer."));
        }

        #[test]
        fn custom_kind_finalize_is_a_progress_entry_not_terminal() {
            let raw = json!({"kind": "custom", "nodeId": "finalize_answer", "message": "wrapping up"});
            let classification = classify(&raw);

            // Only the node's state update terminates the turn.
            assert!(!classification.terminal);
            let event = classification.event.unwrap();
            assert_eq!(event.title, "Finalizing Answer");
            assert!(event.summary.contains("Consolidating findings"));
        }
    }

    mod custom_kind {
        use super::*;

        #[test]
        fn node_id_shape_uses_message_as_summary() {
            let raw = json!({"kind": "custom", "nodeId": "web_research", "message": "searching the web"});
            let event = classify(&raw).event.unwrap();
            assert_eq!(event.title, "Web Research");
            assert_eq!(event.summary, "searching the web");
        }

        #[test]
        fn progress_update_type() {
            let raw = json!({"kind": "custom", "type": "progress_update", "message": "loop 2 of 3"});
            let event = classify(&raw).event.unwrap();
            assert_eq!(event.title, "Progress");
            assert!(!event.degraded);
        }

        #[test]
        fn status_change_type() {
            let raw = json!({"kind": "custom", "type": "status_change", "message": "running"});
            let event = classify(&raw).event.unwrap();
            assert_eq!(event.title, "Status");
        }

        #[test]
        fn error_occurred_type_is_degraded() {
            let raw = json!({"kind": "custom", "type": "error_occurred", "message": "quota hit"});
            let event = classify(&raw).event.unwrap();
            assert!(event.degraded);
            assert_eq!(event.summary, "quota hit");
        }
    }

    mod unknown_and_malformed {
        use super::*;

        #[test]
        fn unknown_node_uses_identity_as_title() {
            let raw = json!({"rerank_results": {"scores": [0.9, 0.4]}});
            let classification = classify(&raw);
            let event = classification.event.unwrap();

            assert_eq!(event.title, "rerank_results");
            assert!(event.summary.contains("scores"));
            assert!(!event.degraded);
            assert!(!classification.terminal);
        }

        #[test]
        fn unexpected_object_yields_one_degraded_event() {
            let raw = json!({"unexpected": true});
            let classification = classify(&raw);

            let event = classification.event.unwrap();
            assert!(event.degraded);
            assert!(!classification.terminal);
            assert!(classification.answer.is_none());
        }

        #[test]
        fn non_object_envelope_is_degraded_not_dropped() {
            for raw in [json!("text"), json!(7), json!([1]), json!(null)] {
                let classification = classify(&raw);
                assert!(classification.event.unwrap().degraded);
            }
        }

        #[test]
        fn degraded_summary_is_bounded() {
            let raw = json!({"unexpected": "x".repeat(1000)});
            let event = classify(&raw).event.unwrap();
            assert!(event.summary.chars().count() <= MAX_SUMMARY_CHARS + 1);
        }
    }

    mod truncation {
        use super::*;

        #[test]
        fn short_text_untouched() {
            assert_eq!(truncate("hello", 10), "hello");
        }

        #[test]
        fn exact_length_untouched() {
            assert_eq!(truncate("abcde", 5), "abcde");
        }

        #[test]
        fn long_text_gets_ellipsis() {
            assert_eq!(truncate("abcdefgh", 5), "abcde…");
        }

        #[test]
        fn multibyte_text_is_not_split() {
            let text = "日本語のテキストです";
            let out = truncate(text, 4);
            assert_eq!(out, "日本語の…");
        }
    }
}
