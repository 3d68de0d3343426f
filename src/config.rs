use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::render::{PlainFormatter, DEFAULT_THINKING_TEXT};
use crate::util::{is_local_endpoint_url, parse_bool_flag};

const STREAM_URL_ENV: &str = "AGUI_STREAM_URL";
const API_KEY_ENV: &str = "AGUI_API_KEY";
const THINKING_TEXT_ENV: &str = "AGUI_THINKING_TEXT";
const SHOW_TOOL_ARGS_ENV: &str = "AGUI_SHOW_TOOL_ARGS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub stream_url: Option<String>,
    pub api_key: Option<String>,
    pub thinking_text: String,
    pub show_tool_args: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let stream_url = non_empty_env(STREAM_URL_ENV);
        let api_key = non_empty_env(API_KEY_ENV);
        let thinking_text =
            non_empty_env(THINKING_TEXT_ENV).unwrap_or_else(|| DEFAULT_THINKING_TEXT.to_string());
        let show_tool_args = std::env::var(SHOW_TOOL_ARGS_ENV)
            .ok()
            .and_then(parse_bool_flag)
            .unwrap_or(true);

        Ok(Self {
            stream_url,
            api_key,
            thinking_text,
            show_tool_args,
        })
    }

    /// Checks the settings live streaming needs. Replay needs none of them.
    pub fn validate_for_streaming(&self) -> Result<()> {
        let stream_url = self
            .stream_url
            .as_deref()
            .with_context(|| format!("{STREAM_URL_ENV} must be set for live streaming"))?;

        if !stream_url.starts_with("http://") && !stream_url.starts_with("https://") {
            bail!("Invalid {STREAM_URL_ENV} '{stream_url}': expected http:// or https:// URL");
        }

        if !is_local_endpoint_url(stream_url) && self.api_key.is_none() {
            bail!("{API_KEY_ENV} must be set for non-local endpoints (url: '{stream_url}')");
        }

        Ok(())
    }

    pub fn formatter(&self) -> PlainFormatter {
        PlainFormatter {
            thinking_text: self.thinking_text.clone(),
            show_args: self.show_tool_args,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_reads_env_and_defaults() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(STREAM_URL_ENV, " http://localhost:8000/agui ");
        std::env::set_var(API_KEY_ENV, "   ");
        std::env::remove_var(THINKING_TEXT_ENV);
        std::env::set_var(SHOW_TOOL_ARGS_ENV, "off");

        let config = Config::load().unwrap();
        assert_eq!(config.stream_url.as_deref(), Some("http://localhost:8000/agui"));
        assert_eq!(config.api_key, None);
        assert_eq!(config.thinking_text, DEFAULT_THINKING_TEXT);
        assert!(!config.show_tool_args);
        assert!(!config.formatter().show_args);

        std::env::remove_var(STREAM_URL_ENV);
        std::env::remove_var(API_KEY_ENV);
        std::env::remove_var(SHOW_TOOL_ARGS_ENV);
    }
}
