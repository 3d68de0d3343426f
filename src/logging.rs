use crate::util::{parse_bool_flag, truncate_chars};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::sync::Mutex;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_PATH: &str = "/tmp/agui-render.log";
const LOG_FILTER_ENV: &str = "AGUI_LOG";
const LOG_PATH_ENV: &str = "AGUI_LOG_PATH";
const DEBUG_PAYLOAD_ENV: &str = "AGUI_DEBUG_PAYLOAD";
const DEFAULT_LOG_FILTER: &str = "warn";
const MAX_LOGGED_PAYLOAD_CHARS: usize = 2000;

/// Installs the process-wide subscriber. Safe to call more than once.
///
/// Output goes to `AGUI_LOG_PATH`, or to a file under `/tmp` while stderr is
/// a terminal so diagnostics never interleave with rendered content.
pub fn init_logging() {
    let default_filter = if debug_payload_enabled() {
        "debug"
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if let Some(path) = resolve_log_path() {
        if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .ok();
            return;
        }
    }

    builder.with_writer(std::io::stderr).try_init().ok();
}

pub fn debug_payload_enabled() -> bool {
    std::env::var(DEBUG_PAYLOAD_ENV)
        .ok()
        .and_then(parse_bool_flag)
        .unwrap_or(false)
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let formatted_payload = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    debug!(url = request_url, payload = %formatted_payload, "stream request payload");
}

pub fn emit_frame_parse_error(payload: &str, parse_error: &anyhow::Error) {
    warn!(
        error = %format!("{parse_error:#}"),
        data = %truncate_chars(payload, MAX_LOGGED_PAYLOAD_CHARS),
        "dropping malformed frame"
    );
}

fn resolve_log_path() -> Option<String> {
    std::env::var(LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            if std::io::stderr().is_terminal() {
                Some(DEFAULT_LOG_PATH.to_string())
            } else {
                None
            }
        })
}
