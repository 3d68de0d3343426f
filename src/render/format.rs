use super::ledger::ToolCallRecord;
use crate::util::truncate_chars;

pub const DEFAULT_THINKING_TEXT: &str = "Thinking...";
const MAX_ARGS_PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A bare `ERROR` event.
    Error,
    /// A `RUN_ERROR` event.
    RunError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Error => "ERROR",
            ErrorKind::RunError => "RUN_ERROR",
        }
    }
}

/// Turns ledger records and error signals into display fragments.
///
/// Fragments are opaque to the sequencer; it only splices them into the
/// content string.
pub trait ContentFormatter {
    fn tool_call(&self, id: &str, record: &ToolCallRecord) -> String;

    fn error(&self, message: &str, kind: ErrorKind, code: Option<&str>) -> String;

    fn thinking(&self) -> String {
        DEFAULT_THINKING_TEXT.to_string()
    }
}

impl<T: ContentFormatter + ?Sized> ContentFormatter for &T {
    fn tool_call(&self, id: &str, record: &ToolCallRecord) -> String {
        (**self).tool_call(id, record)
    }

    fn error(&self, message: &str, kind: ErrorKind, code: Option<&str>) -> String {
        (**self).error(message, kind, code)
    }

    fn thinking(&self) -> String {
        (**self).thinking()
    }
}

/// Inline terminal formatting: each tool call is a bracketed chip, so a
/// burst of calls reads as one strip.
#[derive(Debug, Clone)]
pub struct PlainFormatter {
    pub thinking_text: String,
    pub show_args: bool,
}

impl Default for PlainFormatter {
    fn default() -> Self {
        Self {
            thinking_text: DEFAULT_THINKING_TEXT.to_string(),
            show_args: true,
        }
    }
}

impl ContentFormatter for PlainFormatter {
    fn tool_call(&self, _id: &str, record: &ToolCallRecord) -> String {
        let args = record.args.trim();
        if self.show_args && !args.is_empty() {
            let preview = args.split_whitespace().collect::<Vec<_>>().join(" ");
            format!(
                "[{}({}) · {}]",
                record.name,
                truncate_chars(&preview, MAX_ARGS_PREVIEW_CHARS),
                record.status.as_str()
            )
        } else {
            format!("[{} · {}]", record.name, record.status.as_str())
        }
    }

    fn error(&self, message: &str, kind: ErrorKind, code: Option<&str>) -> String {
        match code {
            Some(code) => format!("[{} {code}] {message}", kind.as_str()),
            None => format!("[{}] {message}", kind.as_str()),
        }
    }

    fn thinking(&self) -> String {
        self.thinking_text.clone()
    }
}
