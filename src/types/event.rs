use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `CUSTOM` event names that carry a [`StepProgressRecord`].
pub const STEP_PROGRESS_EVENT_NAMES: [&str; 2] = ["step_progress", "browser_step_progress"];

/// One tagged event of the agent run protocol.
///
/// Field names follow the wire contract (camelCase); snake_case spellings are
/// accepted because stored logs were sometimes written that way.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolEvent {
    RunStarted,
    TextMessageStart,
    TextMessageContent {
        #[serde(default)]
        delta: String,
    },
    TextMessageEnd,
    ToolCallStart {
        #[serde(rename = "toolCallId", alias = "tool_call_id")]
        tool_call_id: String,
        #[serde(rename = "toolCallName", alias = "tool_call_name")]
        tool_call_name: String,
    },
    ToolCallArgs {
        #[serde(rename = "toolCallId", alias = "tool_call_id")]
        tool_call_id: String,
        #[serde(default)]
        delta: String,
    },
    ToolCallResult {
        #[serde(rename = "toolCallId", alias = "tool_call_id")]
        tool_call_id: String,
        #[serde(default, deserialize_with = "string_or_encoded")]
        content: String,
    },
    ToolCallEnd {
        #[serde(rename = "toolCallId", alias = "tool_call_id")]
        tool_call_id: String,
    },
    Error {
        #[serde(default)]
        error: String,
    },
    RunError {
        #[serde(default)]
        message: String,
        #[serde(default)]
        code: Option<String>,
    },
    RunFinished,
    Custom {
        name: String,
        #[serde(default)]
        value: Value,
    },
    #[serde(other)]
    Unknown,
}

impl ProtocolEvent {
    /// Decodes one already-parsed payload.
    ///
    /// Unknown `type` tags decode to [`ProtocolEvent::Unknown`]; a missing tag
    /// or a known tag with missing required fields is an error.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.get("type").and_then(Value::as_str).is_none() {
            return Err(anyhow!("event payload has no string `type` field"));
        }
        serde_json::from_value(value).context("event payload does not match its `type`")
    }

    pub fn from_json(payload: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(payload).context("frame is not valid JSON")?;
        Self::from_value(value)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProtocolEvent::RunFinished | ProtocolEvent::Error { .. } | ProtocolEvent::RunError { .. }
        )
    }

    /// The step record carried by a step-progress `CUSTOM` event, if any.
    pub fn step_progress(&self) -> Option<Result<StepProgressRecord>> {
        match self {
            ProtocolEvent::Custom { name, value }
                if STEP_PROGRESS_EVENT_NAMES.contains(&name.as_str()) =>
            {
                Some(StepProgressRecord::from_value(value.clone()))
            }
            _ => None,
        }
    }
}

/// One step of a multi-step progress report. Only `step_number` is
/// interpreted; everything else is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepProgressRecord {
    pub step_number: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StepProgressRecord {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).context("step progress value has no integer `step_number`")
    }
}

fn string_or_encoded<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
