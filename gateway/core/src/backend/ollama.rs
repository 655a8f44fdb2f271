//! Ollama Backend Implementation
//!
//! Uses the `/api/generate` endpoint with `"stream": true`. Ollama answers
//! with one JSON object per line:
//!
//! ```text
//! {"model":"tinyllama","response":"He","done":false}
//! {"model":"tinyllama","response":"llo","done":false}
//! {"model":"tinyllama","response":"","done":true,"eval_count":2}
//! ```
//!
//! This backend only frames the body into lines; interpreting them is the
//! aggregator's job.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::traits::{LineStream, LlmBackend, LlmRequest};
use crate::config::UpstreamConfig;
use crate::error::UpstreamError;
use crate::streaming::ndjson_lines;

/// Request body for `/api/generate`
#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

impl<'a> GenerateBody<'a> {
    fn from_request(request: &'a LlmRequest) -> Self {
        Self {
            model: &request.model,
            prompt: &request.prompt,
            stream: request.stream,
            system: request.system.as_deref(),
            options: request
                .temperature
                .map(|temperature| GenerateOptions { temperature }),
        }
    }
}

/// Ollama backend client
#[derive(Clone, Debug)]
pub struct OllamaBackend {
    /// Base URL without trailing slash
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl OllamaBackend {
    /// Create a backend with default timeouts
    pub fn new(base_url: impl Into<String>) -> Result<Self, UpstreamError> {
        Self::from_config(&UpstreamConfig {
            base_url: base_url.into(),
            ..UpstreamConfig::default()
        })
    }

    /// Create from upstream configuration
    ///
    /// There is no deadline on the whole call: generation may take as long as
    /// the model needs, and only a silent connection is given up on.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "Ollama"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn stream_lines(&self, request: &LlmRequest) -> Result<LineStream, UpstreamError> {
        let body = GenerateBody::from_request(request);

        tracing::debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            "Opening upstream stream"
        );

        let response = self
            .http_client
            .post(self.generate_url())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }

        Ok(Box::pin(ndjson_lines(Box::pin(response.bytes_stream()))))
    }
}
