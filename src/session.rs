use crate::api::client::ByteStream;
use crate::render::{ContentFormatter, RunOutcome, RunState, StepsHistory, ToolCallPlacement};
use crate::stream::{StreamItem, StreamParser};
use crate::types::StepProgressRecord;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Content {
        message_id: String,
        content: String,
    },
    Steps {
        message_id: String,
        history: StepsHistory,
    },
    Finished {
        message_id: String,
        outcome: RunOutcome,
    },
}

/// Decoding state for one live run.
///
/// Built once when the run starts and fed every chunk the transport delivers;
/// after a terminal event or the `[DONE]` sentinel it ignores further input.
pub struct StreamSession<F: ContentFormatter> {
    message_id: String,
    parser: StreamParser,
    run: RunState,
    formatter: F,
    saw_done: bool,
}

impl<F: ContentFormatter> StreamSession<F> {
    pub fn new(message_id: impl Into<String>, formatter: F) -> Self {
        Self {
            message_id: message_id.into(),
            parser: StreamParser::new(),
            run: RunState::new(ToolCallPlacement::OnStart),
            formatter,
            saw_done: false,
        }
    }

    /// Processes one transport chunk, returning an update for every event
    /// that changed the rendered content or the step history.
    pub fn apply_chunk(&mut self, chunk: &[u8]) -> Vec<SessionUpdate> {
        if self.is_closed() {
            return Vec::new();
        }
        let items = self.parser.process(chunk);
        self.apply_items(items)
    }

    /// Processes the unterminated last line once the transport has closed.
    pub fn finish(&mut self) -> Vec<SessionUpdate> {
        if self.is_closed() {
            return Vec::new();
        }
        let items = self.parser.flush();
        self.apply_items(items)
    }

    fn apply_items(&mut self, items: Vec<StreamItem>) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        for item in items {
            if self.is_closed() {
                debug!(message_id = %self.message_id, "dropping frames after end of run");
                break;
            }
            let event = match item {
                StreamItem::Done => {
                    self.saw_done = true;
                    continue;
                }
                StreamItem::Event(event) => event,
            };

            let applied = self.run.apply(&event, &self.formatter);
            if applied.content_changed {
                updates.push(SessionUpdate::Content {
                    message_id: self.message_id.clone(),
                    content: self.content(),
                });
            }
            if applied.steps_changed {
                updates.push(SessionUpdate::Steps {
                    message_id: self.message_id.clone(),
                    history: self.run.steps().history().clone(),
                });
            }
        }
        updates
    }

    pub fn is_closed(&self) -> bool {
        self.saw_done || self.run.outcome().is_some()
    }

    pub fn content(&self) -> String {
        self.run.render(&self.formatter)
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn steps_history(&self) -> &StepsHistory {
        self.run.steps().history()
    }

    pub fn last_step(&self) -> Option<&StepProgressRecord> {
        self.run.steps().last_step()
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.run.outcome()
    }
}

/// Feeds `stream` into `session` until the run ends, the stream closes, or
/// `cancel` fires.
///
/// On cancellation the session is left exactly as last emitted. Transport
/// errors end the run as [`RunOutcome::Failed`] without touching content.
pub async fn drive_stream<F: ContentFormatter>(
    mut stream: ByteStream,
    session: &mut StreamSession<F>,
    cancel: &CancellationToken,
    update_tx: Option<&mpsc::UnboundedSender<SessionUpdate>>,
) -> RunOutcome {
    let outcome = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break RunOutcome::Aborted,
            next = stream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                for update in session.apply_chunk(&chunk) {
                    emit_session_update(update_tx, update);
                }
                if session.is_closed() {
                    break session.outcome().cloned().unwrap_or(RunOutcome::Ended);
                }
            }
            Some(Err(error)) => {
                warn!(message_id = %session.message_id(), error = %format!("{error:#}"), "stream transport failed");
                break RunOutcome::Failed {
                    message: format!("{error:#}"),
                    code: None,
                };
            }
            None => {
                for update in session.finish() {
                    emit_session_update(update_tx, update);
                }
                break session.outcome().cloned().unwrap_or(RunOutcome::Ended);
            }
        }
    };

    emit_session_update(
        update_tx,
        SessionUpdate::Finished {
            message_id: session.message_id().to_string(),
            outcome: outcome.clone(),
        },
    );
    outcome
}

fn emit_session_update(
    update_tx: Option<&mpsc::UnboundedSender<SessionUpdate>>,
    update: SessionUpdate,
) {
    if let Some(tx) = update_tx {
        let _ = tx.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PlainFormatter;
    use crate::test_support::{chunk_stream, failing_chunk_stream};

    fn contents(updates: &[SessionUpdate]) -> Vec<&str> {
        updates
            .iter()
            .filter_map(|update| match update {
                SessionUpdate::Content { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_emits_content_after_each_changing_event() {
        let mut session = StreamSession::new("m1", PlainFormatter::default());
        let updates = session.apply_chunk(
            b"data: {\"type\":\"RUN_STARTED\"}\n\ndata: {\"type\":\"TEXT_MESSAGE_START\"}\n\ndata: {\"type\":\"TEXT_MESSAGE_CONTENT\",\"delta\":\"Hel\"}\n\ndata: {\"type\":\"TEXT_MESSAGE_CONTENT\",\"delta\":\"lo\"}\n\n",
        );
        assert_eq!(contents(&updates), vec!["Thinking...", "Hel", "Hello"]);
        assert!(!session.is_closed());
    }

    #[test]
    fn test_run_started_after_text_adds_no_placeholder() {
        let mut session = StreamSession::new("m1", PlainFormatter::default());
        session.apply_chunk(b"data: {\"type\":\"TEXT_MESSAGE_CONTENT\",\"delta\":\"hi\"}\n");
        assert!(session.apply_chunk(b"data: {\"type\":\"RUN_STARTED\"}\n").is_empty());
        assert_eq!(session.content(), "hi");
    }

    #[test]
    fn test_done_sentinel_closes_session() {
        let mut session = StreamSession::new("m1", PlainFormatter::default());
        session.apply_chunk(b"data: {\"type\":\"TEXT_MESSAGE_CONTENT\",\"delta\":\"a\"}\ndata: [DONE]\n");
        assert!(session.is_closed());
        assert!(session
            .apply_chunk(b"data: {\"type\":\"TEXT_MESSAGE_CONTENT\",\"delta\":\"b\"}\n")
            .is_empty());
        assert_eq!(session.content(), "a");
        assert_eq!(session.outcome(), None);
    }

    #[test]
    fn test_finish_flushes_unterminated_frame() {
        let mut session = StreamSession::new("m1", PlainFormatter::default());
        assert!(session
            .apply_chunk(b"data: {\"type\":\"TEXT_MESSAGE_CONTENT\",\"delta\":\"tail\"}")
            .is_empty());
        assert_eq!(contents(&session.finish()), vec!["tail"]);
    }

    #[test]
    fn test_step_updates_are_reported() {
        let mut session = StreamSession::new("m1", PlainFormatter::default());
        let updates = session.apply_chunk(
            b"data: {\"type\":\"CUSTOM\",\"name\":\"step_progress\",\"value\":{\"step_number\":1}}\n",
        );
        assert!(matches!(
            updates.as_slice(),
            [SessionUpdate::Steps { history, .. }] if history.is_running && history.steps.len() == 1
        ));
        assert_eq!(session.last_step().map(|s| s.step_number), Some(1));
    }

    #[tokio::test]
    async fn test_drive_stream_reassembles_split_frames() {
        let stream = chunk_stream(&[
            "data: {\"type\":\"RUN_ST",
            "ARTED\"}\n\ndata: {\"type\":\"TEXT_MESSAGE_CONTENT\",",
            "\"delta\":\"hi\"}\n\ndata: {\"type\":\"RUN_FINISHED\"}\n\n",
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = StreamSession::new("m1", PlainFormatter::default());

        let outcome = drive_stream(stream, &mut session, &CancellationToken::new(), Some(&tx)).await;
        assert_eq!(outcome, RunOutcome::Finished);
        assert_eq!(session.content(), "hi");

        let mut received = Vec::new();
        while let Ok(update) = rx.try_recv() {
            received.push(update);
        }
        assert_eq!(contents(&received), vec!["Thinking...", "hi"]);
        assert_eq!(
            received.last(),
            Some(&SessionUpdate::Finished {
                message_id: "m1".to_string(),
                outcome: RunOutcome::Finished,
            })
        );
    }

    #[tokio::test]
    async fn test_drive_stream_transport_error_keeps_content() {
        let stream = failing_chunk_stream(
            &["data: {\"type\":\"TEXT_MESSAGE_CONTENT\",\"delta\":\"partial\"}\n"],
            "connection reset",
        );
        let mut session = StreamSession::new("m1", PlainFormatter::default());
        let outcome = drive_stream(stream, &mut session, &CancellationToken::new(), None).await;
        assert_eq!(
            outcome,
            RunOutcome::Failed {
                message: "connection reset".to_string(),
                code: None,
            }
        );
        assert_eq!(session.content(), "partial");
    }

    #[tokio::test]
    async fn test_drive_stream_without_terminal_event_ends() {
        let stream = chunk_stream(&["data: {\"type\":\"TEXT_MESSAGE_CONTENT\",\"delta\":\"x\"}"]);
        let mut session = StreamSession::new("m1", PlainFormatter::default());
        let outcome = drive_stream(stream, &mut session, &CancellationToken::new(), None).await;
        assert_eq!(outcome, RunOutcome::Ended);
        assert_eq!(session.content(), "x");
    }

    #[tokio::test]
    async fn test_cancel_leaves_content_as_last_emitted() {
        let first = chunk_stream(&["data: {\"type\":\"TEXT_MESSAGE_CONTENT\",\"delta\":\"so far\"}\n"]);
        let stream: ByteStream = Box::pin(first.chain(futures::stream::pending()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let _ = rx.recv().await;
                cancel.cancel();
            })
        };

        let mut session = StreamSession::new("m1", PlainFormatter::default());
        let outcome = drive_stream(stream, &mut session, &cancel, Some(&tx)).await;
        canceller.await.unwrap();

        assert_eq!(outcome, RunOutcome::Aborted);
        assert_eq!(session.content(), "so far");
        assert_eq!(session.outcome(), None);
    }
}
