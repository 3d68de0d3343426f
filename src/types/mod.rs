pub mod event;

pub use event::{ProtocolEvent, StepProgressRecord, STEP_PROGRESS_EVENT_NAMES};
