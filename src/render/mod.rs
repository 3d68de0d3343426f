pub mod blocks;
pub mod format;
pub mod ledger;
pub mod run;
pub mod sequencer;
pub mod steps;

pub use blocks::ContentBlock;
pub use format::{ContentFormatter, ErrorKind, PlainFormatter, DEFAULT_THINKING_TEXT};
pub use ledger::{ToolCallLedger, ToolCallRecord, ToolCallStatus};
pub use run::{Applied, RunState};
pub use sequencer::{ContentSequencer, RunOutcome, ToolCallPlacement};
pub use steps::{StepProgressTrack, StepsHistory};
