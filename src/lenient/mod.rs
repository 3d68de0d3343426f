pub mod fallback;
pub mod normalize;

pub use fallback::{extract_object_slices, parse_event_log, recover_objects};
pub use normalize::{normalize_literal, parse_lenient, unwrap_envelope};
