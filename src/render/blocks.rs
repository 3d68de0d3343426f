use serde::{Deserialize, Serialize};

/// One renderable unit of a run, in display order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Narrative text, rendered verbatim.
    Text { content: String },
    /// A tool call, rendered from the ledger record with this id.
    ToolCall { id: String },
    /// Activity placeholder shown before any content has arrived.
    Thinking,
}

impl ContentBlock {
    pub fn is_tool_call(&self) -> bool {
        matches!(self, ContentBlock::ToolCall { .. })
    }
}
