use crate::types::StepProgressRecord;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StepsHistory {
    /// Ascending by `step_number`, at most one record per step.
    pub steps: Vec<StepProgressRecord>,
    #[serde(rename = "isRunning")]
    pub is_running: bool,
}

/// Step-number keyed progress history reported alongside a run.
#[derive(Debug, Default)]
pub struct StepProgressTrack {
    history: StepsHistory,
    last_step: Option<StepProgressRecord>,
}

impl StepProgressTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, record: StepProgressRecord) {
        let steps = &mut self.history.steps;
        match steps.binary_search_by_key(&record.step_number, |step| step.step_number) {
            Ok(index) => steps[index] = record.clone(),
            Err(index) => steps.insert(index, record.clone()),
        }
        self.last_step = Some(record);
        self.history.is_running = true;
    }

    pub fn finish(&mut self) {
        self.history.is_running = false;
    }

    pub fn history(&self) -> &StepsHistory {
        &self.history
    }

    pub fn last_step(&self) -> Option<&StepProgressRecord> {
        self.last_step.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.history.steps.is_empty()
    }
}
