use super::format::ContentFormatter;
use super::sequencer::{ContentSequencer, RunOutcome, ToolCallPlacement};
use super::steps::StepProgressTrack;
use crate::types::ProtocolEvent;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    pub content_changed: bool,
    pub steps_changed: bool,
}

impl Applied {
    pub fn any(self) -> bool {
        self.content_changed || self.steps_changed
    }
}

/// All per-run decoding state: blocks, tool calls, and step progress.
#[derive(Debug)]
pub struct RunState {
    sequencer: ContentSequencer,
    steps: StepProgressTrack,
}

impl RunState {
    pub fn new(placement: ToolCallPlacement) -> Self {
        Self {
            sequencer: ContentSequencer::new(placement),
            steps: StepProgressTrack::new(),
        }
    }

    pub fn apply<F: ContentFormatter>(&mut self, event: &ProtocolEvent, formatter: &F) -> Applied {
        if self.sequencer.is_terminal() {
            return Applied::default();
        }

        let mut steps_changed = false;
        match event.step_progress() {
            Some(Ok(record)) => {
                self.steps.upsert(record);
                steps_changed = true;
            }
            Some(Err(error)) => warn!(%error, "ignoring malformed step progress"),
            None => {}
        }

        Applied {
            content_changed: self.sequencer.apply(event, formatter),
            steps_changed,
        }
    }

    pub fn render<F: ContentFormatter>(&self, formatter: &F) -> String {
        self.sequencer.render(formatter)
    }

    pub fn sequencer(&self) -> &ContentSequencer {
        &self.sequencer
    }

    pub fn sequencer_mut(&mut self) -> &mut ContentSequencer {
        &mut self.sequencer
    }

    pub fn steps(&self) -> &StepProgressTrack {
        &self.steps
    }

    pub fn steps_mut(&mut self) -> &mut StepProgressTrack {
        &mut self.steps
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.sequencer.outcome()
    }
}
