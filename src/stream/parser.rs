use super::frame::{extract_frame, Frame};
use super::framer::LineFramer;
use crate::logging::emit_frame_parse_error;
use crate::types::ProtocolEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Event(ProtocolEvent),
    Done,
}

/// Turns raw transport chunks into protocol events.
///
/// Live frames are always strict JSON; a frame that fails to decode is logged
/// and skipped without ending the stream.
#[derive(Debug, Default)]
pub struct StreamParser {
    framer: LineFramer,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, chunk: &[u8]) -> Vec<StreamItem> {
        self.framer
            .push_bytes(chunk)
            .iter()
            .filter_map(|line| decode_line(line))
            .collect()
    }

    /// Decodes the final unterminated line once the transport has closed.
    pub fn flush(&mut self) -> Vec<StreamItem> {
        self.framer
            .finish()
            .and_then(|line| decode_line(&line))
            .into_iter()
            .collect()
    }
}

fn decode_line(line: &str) -> Option<StreamItem> {
    match extract_frame(line)? {
        Frame::Done => Some(StreamItem::Done),
        Frame::Data(payload) => match ProtocolEvent::from_json(&payload) {
            Ok(event) => Some(StreamItem::Event(event)),
            Err(error) => {
                emit_frame_parse_error(&payload, &error);
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reassembles_frame_split_across_chunks() {
        let mut parser = StreamParser::new();
        assert!(parser.process(b"data: {\"type\":\"RUN_ST").is_empty());
        assert_eq!(
            parser.process(b"ARTED\"}\n"),
            vec![StreamItem::Event(ProtocolEvent::RunStarted)]
        );
    }

    #[test]
    fn test_bad_frame_is_skipped() {
        let mut parser = StreamParser::new();
        let items = parser.process(
            b"data: {not json}\n\ndata: {\"type\":\"TEXT_MESSAGE_CONTENT\",\"delta\":\"hi\"}\n\n",
        );
        assert_eq!(
            items,
            vec![StreamItem::Event(ProtocolEvent::TextMessageContent {
                delta: "hi".to_string()
            })]
        );
    }

    #[test]
    fn test_flush_decodes_unterminated_tail() {
        let mut parser = StreamParser::new();
        assert!(parser.process(b"data: [DONE]").is_empty());
        assert_eq!(parser.flush(), vec![StreamItem::Done]);
        assert!(parser.flush().is_empty());
    }
}
