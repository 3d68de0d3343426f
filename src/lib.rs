pub mod api;
pub mod config;
pub mod lenient;
pub mod logging;
pub mod render;
pub mod replay;
pub mod session;
pub mod stream;
pub mod types;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use render::{ContentFormatter, PlainFormatter, RunOutcome, StepsHistory, ToolCallRecord};
pub use replay::{decode_history, HistoryRecord, ReplayOutput};
pub use session::{drive_stream, SessionUpdate, StreamSession};
pub use types::{ProtocolEvent, StepProgressRecord};
