use super::normalize::{parse_lenient, unwrap_envelope};
use serde_json::Value;
use tracing::{debug, warn};

/// Returns the top-level `{...}` slices of `text`, in order.
///
/// Braces inside single- or double-quoted strings do not count, and an
/// escaped quote never opens or closes a string. An object that is still
/// open when the input ends is not returned.
pub fn extract_object_slices(text: &str) -> Vec<&str> {
    let mut slices = Vec::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut start = 0usize;

    for (index, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if in_single || in_double {
            match ch {
                '\\' => escaped = true,
                '\'' if in_single => in_single = false,
                '"' if in_double => in_double = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '\'' => in_single = true,
            '"' => in_double = true,
            '{' => {
                if depth == 0 {
                    start = index;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    slices.push(&text[start..=index]);
                }
            }
            _ => {}
        }
    }

    slices
}

/// Recovers every independently parseable object from a damaged payload.
pub fn recover_objects(raw: &str) -> Vec<Value> {
    let unwrapped = unwrap_envelope(raw);
    extract_object_slices(&unwrapped)
        .into_iter()
        .filter_map(|slice| match parse_lenient(slice) {
            Ok(value @ Value::Object(_)) => Some(value),
            Ok(_) => None,
            Err(error) => {
                debug!(%error, slice_len = slice.len(), "dropping unrecoverable record");
                None
            }
        })
        .collect()
}

/// Decodes a stored event log into its items.
///
/// The whole payload is tried first; if it does not come out as a list, the
/// objects that can still be recovered are returned instead. `None` means
/// nothing at all could be recovered.
pub fn parse_event_log(raw: &str) -> Option<Vec<Value>> {
    match parse_lenient(raw) {
        Ok(Value::Array(items)) => return Some(items),
        Ok(object @ Value::Object(_)) => return Some(vec![object]),
        Ok(_) => {}
        Err(error) => debug!(%error, "event log failed whole-payload decoding"),
    }

    let recovered = recover_objects(raw);
    if recovered.is_empty() {
        warn!(payload_len = raw.len(), "event log is unrecoverable");
        return None;
    }
    warn!(recovered = recovered.len(), "event log partially recovered");
    Some(recovered)
}
