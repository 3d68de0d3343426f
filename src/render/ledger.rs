use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Calling,
    Completed,
}

impl ToolCallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolCallStatus::Calling => "calling",
            ToolCallStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolCallRecord {
    pub name: String,
    pub args: String,
    pub status: ToolCallStatus,
    pub result: Option<String>,
}

/// Every tool call seen during one run, keyed by call id.
///
/// Entries are never removed while the run lasts. Updates for an id that was
/// never opened are dropped: damaged logs do reference such ids.
#[derive(Debug, Default)]
pub struct ToolCallLedger {
    records: HashMap<String, ToolCallRecord>,
}

impl ToolCallLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, id: &str, name: &str) -> bool {
        if self.records.contains_key(id) {
            warn!(tool_call_id = id, "tool call opened twice; keeping the first");
            return false;
        }
        self.records.insert(
            id.to_string(),
            ToolCallRecord {
                name: name.to_string(),
                args: String::new(),
                status: ToolCallStatus::Calling,
                result: None,
            },
        );
        true
    }

    pub fn append_args(&mut self, id: &str, delta: &str) -> bool {
        match self.records.get_mut(id) {
            Some(record) => {
                record.args.push_str(delta);
                true
            }
            None => {
                debug!(tool_call_id = id, "args for unknown tool call");
                false
            }
        }
    }

    pub fn complete(&mut self, id: &str, result: &str) -> bool {
        match self.records.get_mut(id) {
            Some(record) => {
                record.status = ToolCallStatus::Completed;
                record.result = Some(result.to_string());
                true
            }
            None => {
                debug!(tool_call_id = id, "result for unknown tool call");
                false
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ToolCallRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
