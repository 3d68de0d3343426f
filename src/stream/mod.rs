pub mod frame;
pub mod framer;
pub mod parser;

pub use frame::{extract_frame, Frame, DATA_PREFIX, DONE_SENTINEL};
pub use framer::LineFramer;
pub use parser::{StreamItem, StreamParser};
