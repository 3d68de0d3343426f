use super::blocks::ContentBlock;
use super::format::{ContentFormatter, ErrorKind};
use super::ledger::{ToolCallLedger, ToolCallRecord};
use crate::types::ProtocolEvent;
use tracing::debug;

const BLOCK_SEPARATOR: &str = "\n\n";

/// How a run ended, as seen by whoever drove it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// `RUN_FINISHED` was received.
    Finished,
    /// `ERROR`/`RUN_ERROR` was received, or the transport failed.
    Failed {
        message: String,
        code: Option<String>,
    },
    /// The caller cancelled the stream.
    Aborted,
    /// The stream closed without a terminal event.
    Ended,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Finished | RunOutcome::Ended)
    }
}

/// Where a tool call takes its place in the block list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCallPlacement {
    /// At `TOOL_CALL_START` (live streams).
    OnStart,
    /// At `TOOL_CALL_END` (replayed logs).
    OnEnd,
}

/// Orders text, tool calls and the activity placeholder of one run.
///
/// Text is accumulated in an open buffer and only becomes a block when a
/// tool call or an error has to be placed after it.
#[derive(Debug)]
pub struct ContentSequencer {
    blocks: Vec<ContentBlock>,
    open_text: String,
    ledger: ToolCallLedger,
    placement: ToolCallPlacement,
    /// Opened calls still waiting for their block, in open order.
    unplaced: Vec<String>,
    outcome: Option<RunOutcome>,
}

impl ContentSequencer {
    pub fn new(placement: ToolCallPlacement) -> Self {
        Self {
            blocks: Vec::new(),
            open_text: String::new(),
            ledger: ToolCallLedger::new(),
            placement,
            unplaced: Vec::new(),
            outcome: None,
        }
    }

    /// Applies one event and reports whether the rendered content may have
    /// changed. Everything after a terminal event is ignored.
    pub fn apply<F: ContentFormatter>(&mut self, event: &ProtocolEvent, formatter: &F) -> bool {
        if self.outcome.is_some() {
            debug!(?event, "event after terminal event ignored");
            return false;
        }

        match event {
            ProtocolEvent::RunStarted => {
                if !self.blocks.is_empty() || !self.open_text.is_empty() {
                    return false;
                }
                self.blocks.push(ContentBlock::Thinking);
                true
            }
            ProtocolEvent::TextMessageStart | ProtocolEvent::TextMessageEnd => false,
            ProtocolEvent::TextMessageContent { delta } => {
                let removed = self.clear_placeholder();
                self.open_text.push_str(delta);
                removed || !delta.is_empty()
            }
            ProtocolEvent::ToolCallStart {
                tool_call_id,
                tool_call_name,
            } => {
                if !self.ledger.open(tool_call_id, tool_call_name) {
                    return false;
                }
                match self.placement {
                    ToolCallPlacement::OnStart => self.place_tool_call(tool_call_id),
                    ToolCallPlacement::OnEnd => {
                        self.unplaced.push(tool_call_id.clone());
                        false
                    }
                }
            }
            ProtocolEvent::ToolCallArgs {
                tool_call_id,
                delta,
            } => self.ledger.append_args(tool_call_id, delta) && self.is_placed(tool_call_id),
            ProtocolEvent::ToolCallResult {
                tool_call_id,
                content,
            } => self.ledger.complete(tool_call_id, content) && self.is_placed(tool_call_id),
            ProtocolEvent::ToolCallEnd { tool_call_id } => match self.placement {
                ToolCallPlacement::OnEnd if self.ledger.contains(tool_call_id) => {
                    self.place_tool_call(tool_call_id)
                }
                ToolCallPlacement::OnEnd => {
                    debug!(tool_call_id = %tool_call_id, "end for unknown tool call");
                    false
                }
                ToolCallPlacement::OnStart => false,
            },
            ProtocolEvent::Error { error } => {
                self.fail(formatter.error(error, ErrorKind::Error, None));
                self.outcome = Some(RunOutcome::Failed {
                    message: error.clone(),
                    code: None,
                });
                true
            }
            ProtocolEvent::RunError { message, code } => {
                self.fail(formatter.error(message, ErrorKind::RunError, code.as_deref()));
                self.outcome = Some(RunOutcome::Failed {
                    message: message.clone(),
                    code: code.clone(),
                });
                true
            }
            ProtocolEvent::RunFinished => {
                self.outcome = Some(RunOutcome::Finished);
                false
            }
            ProtocolEvent::Custom { name, .. } => {
                debug!(name = %name, "custom event has no content");
                false
            }
            ProtocolEvent::Unknown => {
                debug!("ignoring event of unknown type");
                false
            }
        }
    }

    /// Removes the activity placeholder. Returns whether one was present.
    pub fn clear_placeholder(&mut self) -> bool {
        let before = self.blocks.len();
        self.blocks.retain(|block| *block != ContentBlock::Thinking);
        self.blocks.len() != before
    }

    pub fn render<F: ContentFormatter>(&self, formatter: &F) -> String {
        let open_text = (!self.open_text.is_empty()).then(|| ContentBlock::Text {
            content: self.open_text.clone(),
        });

        let mut content = String::new();
        let mut previous_was_tool: Option<bool> = None;
        for block in self.blocks.iter().chain(open_text.iter()) {
            let fragment = match block {
                ContentBlock::Text { content } => content.clone(),
                ContentBlock::Thinking => formatter.thinking(),
                ContentBlock::ToolCall { id } => match self.ledger.get(id) {
                    Some(record) => formatter.tool_call(id, record),
                    None => continue,
                },
            };
            let is_tool = block.is_tool_call();
            match previous_was_tool {
                Some(true) if is_tool => {}
                Some(_) => content.push_str(BLOCK_SEPARATOR),
                None => {}
            }
            content.push_str(&fragment);
            previous_was_tool = Some(is_tool);
        }
        content
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn open_text(&self) -> &str {
        &self.open_text
    }

    pub fn tool_call(&self, id: &str) -> Option<&ToolCallRecord> {
        self.ledger.get(id)
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    fn place_tool_call(&mut self, id: &str) -> bool {
        if self.is_placed(id) {
            return false;
        }
        self.clear_placeholder();
        self.flush_text();
        self.unplaced.retain(|pending| pending != id);
        self.blocks.push(ContentBlock::ToolCall { id: id.to_string() });
        true
    }

    fn is_placed(&self, id: &str) -> bool {
        self.blocks
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolCall { id: placed } if placed == id))
    }

    fn flush_text(&mut self) {
        if !self.open_text.is_empty() {
            self.blocks.push(ContentBlock::Text {
                content: std::mem::take(&mut self.open_text),
            });
        }
    }

    /// Ends the run with an error block. Calls still in flight are placed
    /// first so a failed run shows what it was doing.
    fn fail(&mut self, fragment: String) {
        self.clear_placeholder();
        self.flush_text();
        for id in std::mem::take(&mut self.unplaced) {
            self.blocks.push(ContentBlock::ToolCall { id });
        }
        self.blocks.push(ContentBlock::Text { content: fragment });
    }
}
