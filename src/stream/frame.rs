pub const DATA_PREFIX: &str = "data:";
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(String),
    Done,
}

/// Extracts the payload of a `data:` line. Blank lines, comments and other
/// SSE fields (`event:`, `id:`, `retry:`) yield `None`.
pub fn extract_frame(line: &str) -> Option<Frame> {
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();
    if payload.is_empty() {
        return None;
    }
    if payload == DONE_SENTINEL {
        return Some(Frame::Done);
    }
    Some(Frame::Data(payload.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_prefix_and_whitespace() {
        assert_eq!(
            extract_frame("data:   {\"type\":\"RUN_FINISHED\"}  "),
            Some(Frame::Data("{\"type\":\"RUN_FINISHED\"}".to_string()))
        );
    }

    #[test]
    fn test_recognizes_done_sentinel() {
        assert_eq!(extract_frame("data: [DONE]"), Some(Frame::Done));
    }

    #[test]
    fn test_ignores_blank_and_foreign_lines() {
        assert_eq!(extract_frame(""), None);
        assert_eq!(extract_frame("   "), None);
        assert_eq!(extract_frame("event: message"), None);
        assert_eq!(extract_frame(": keep-alive"), None);
        assert_eq!(extract_frame("data:"), None);
    }
}
