use crate::lenient::parse_event_log;
use crate::render::{ContentFormatter, RunState, StepsHistory, ToolCallPlacement};
use crate::types::{ProtocolEvent, StepProgressRecord};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Stored message type whose string content is a serialized event log.
pub const EVENT_LOG_MESSAGE_TYPE: &str = "ts";

/// One stored conversation entry, classified for replay.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryRecord {
    /// An already-structured event list.
    Events(Vec<Value>),
    /// An event log serialized as text, possibly in the relaxed dialect.
    Raw(String),
    /// Anything else; displayed as-is.
    Opaque(String),
}

impl HistoryRecord {
    pub fn from_stored(message_type: &str, content: Value) -> Self {
        match content {
            Value::Array(items) => HistoryRecord::Events(items),
            Value::String(text) if message_type == EVENT_LOG_MESSAGE_TYPE => HistoryRecord::Raw(text),
            Value::String(text) => HistoryRecord::Opaque(text),
            Value::Null => HistoryRecord::Opaque(String::new()),
            other => HistoryRecord::Opaque(other.to_string()),
        }
    }

    /// Classifies an exported record: a `{"type", "content"}` object, a bare
    /// event list, or anything else taken as a serialized event log.
    pub fn from_export(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(mut entry)) if entry.contains_key("content") => {
                let message_type = entry
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or(EVENT_LOG_MESSAGE_TYPE)
                    .to_string();
                let content = entry.remove("content").unwrap_or(Value::Null);
                HistoryRecord::from_stored(&message_type, content)
            }
            Ok(Value::Array(items)) => HistoryRecord::Events(items),
            _ => HistoryRecord::Raw(text.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ReplayOutput {
    pub content: String,
    #[serde(rename = "stepProgress", skip_serializing_if = "Option::is_none")]
    pub step_progress: Option<StepProgressRecord>,
    #[serde(rename = "stepsHistory", skip_serializing_if = "Option::is_none")]
    pub steps_history: Option<StepsHistory>,
}

impl ReplayOutput {
    fn verbatim(text: &str) -> Self {
        Self {
            content: text.to_string(),
            ..Self::default()
        }
    }
}

/// Decodes one stored record into its final content.
///
/// Never fails: a log that cannot be decoded at all is shown verbatim.
pub fn decode_history<F: ContentFormatter>(record: &HistoryRecord, formatter: &F) -> ReplayOutput {
    match record {
        HistoryRecord::Opaque(text) => ReplayOutput::verbatim(text),
        HistoryRecord::Events(items) => replay_events(items, formatter)
            .unwrap_or_else(|| ReplayOutput::verbatim(&Value::Array(items.clone()).to_string())),
        HistoryRecord::Raw(text) => parse_event_log(text)
            .and_then(|items| replay_events(&items, formatter))
            .unwrap_or_else(|| ReplayOutput::verbatim(text)),
    }
}

/// Runs a decoded event list to completion. `None` if no item was an event.
pub fn replay_events<F: ContentFormatter>(items: &[Value], formatter: &F) -> Option<ReplayOutput> {
    let mut run = RunState::new(ToolCallPlacement::OnEnd);
    let mut decoded = 0usize;

    for (index, item) in items.iter().enumerate() {
        match ProtocolEvent::from_value(item.clone()) {
            Ok(event) => {
                decoded += 1;
                run.apply(&event, formatter);
            }
            Err(error) => debug!(index, %error, "skipping undecodable history item"),
        }
    }

    if decoded == 0 {
        return None;
    }

    run.sequencer_mut().clear_placeholder();
    run.steps_mut().finish();

    let steps = run.steps();
    let (step_progress, steps_history) = if steps.is_empty() {
        (None, None)
    } else {
        (steps.last_step().cloned(), Some(steps.history().clone()))
    };

    Some(ReplayOutput {
        content: run.render(formatter),
        step_progress,
        steps_history,
    })
}
