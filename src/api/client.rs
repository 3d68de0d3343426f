use crate::config::Config;
use crate::logging::{debug_payload_enabled, emit_debug_payload};
use crate::util::is_local_endpoint_url;
use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;

/// A cancellable source of transport chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Opens event streams against the configured endpoint.
#[derive(Clone)]
pub struct StreamClient {
    http: reqwest::Client,
    api_key: Option<String>,
    stream_url: String,
}

impl StreamClient {
    pub fn new(config: &Config) -> Result<Self> {
        let stream_url = config
            .stream_url
            .clone()
            .context("no stream URL configured")?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            stream_url,
        })
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    pub async fn open_stream(&self, payload: &Value) -> Result<ByteStream> {
        let request_url = self.stream_url.clone();
        let mut request = self
            .http
            .post(&request_url)
            .header("content-type", "application/json")
            .header("accept", "text/event-stream")
            .json(payload);

        if debug_payload_enabled() {
            emit_debug_payload(&request_url, payload);
        }

        if let Some(api_key) = &self.api_key {
            request = request.header("authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|error| map_stream_request_error(error, &request_url))?
            .error_for_status()
            .map_err(|error| map_stream_request_error(error, &request_url))?;

        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_stream_request_error(error, &request_url))
        });
        Ok(Box::pin(stream))
    }
}

fn map_stream_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow!(
            "cannot reach local stream endpoint '{}': {}. Start your local server or update AGUI_STREAM_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow!("cannot reach stream endpoint '{}': {}", request_url, error);
    }
    if error.is_timeout() {
        return anyhow!("stream request to '{}' timed out: {}", request_url, error);
    }
    if let Some(status) = error.status() {
        return anyhow!(
            "stream endpoint '{}' returned HTTP {}: {}",
            request_url,
            status,
            error
        );
    }
    anyhow!("stream request to '{}' failed: {}", request_url, error)
}
