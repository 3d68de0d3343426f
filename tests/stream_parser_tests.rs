use agui_render::stream::{StreamItem, StreamParser};
use agui_render::types::ProtocolEvent;

#[test]
fn test_fragmented_events() {
    let mut parser = StreamParser::new();

    let chunk1 = b"data: {\"type\":\"RUN_ST";
    assert!(parser.process(chunk1).is_empty());

    let chunk2 = b"ARTED\"}\n";
    let events = parser.process(chunk2);
    assert_eq!(events, vec![StreamItem::Event(ProtocolEvent::RunStarted)]);
}

#[test]
fn test_parse_error_handling() {
    let mut parser = StreamParser::new();

    let chunk = b"data: {invalid json}\n\ndata: {\"no_type\":1}\n\n";
    assert!(parser.process(chunk).is_empty());
}

#[test]
fn test_tool_call_frames_are_decoded_in_order() {
    let mut parser = StreamParser::new();

    let chunk = b"data: {\"type\":\"TOOL_CALL_START\",\"toolCallId\":\"call_1\",\"toolCallName\":\"read_file\"}\n\ndata: {\"type\":\"TOOL_CALL_ARGS\",\"toolCallId\":\"call_1\",\"delta\":\"{\\\"path\\\":\\\"src/\"}\n\n";
    let items = parser.process(chunk);
    assert_eq!(items.len(), 2);

    match &items[1] {
        StreamItem::Event(ProtocolEvent::ToolCallArgs {
            tool_call_id,
            delta,
        }) => {
            assert_eq!(tool_call_id, "call_1");
            assert_eq!(delta, "{\"path\":\"src/");
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[test]
fn test_done_sentinel_and_foreign_lines() {
    let mut parser = StreamParser::new();

    let chunk = b"event: message\nid: 7\n: ping\n\ndata: [DONE]\n\n";
    assert_eq!(parser.process(chunk), vec![StreamItem::Done]);
}

#[test]
fn test_unknown_event_types_pass_through_as_unknown() {
    let mut parser = StreamParser::new();

    let chunk = b"data: {\"type\":\"STATE_DELTA\",\"delta\":[]}\r\n";
    assert_eq!(
        parser.process(chunk),
        vec![StreamItem::Event(ProtocolEvent::Unknown)]
    );
}
