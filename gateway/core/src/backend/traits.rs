//! LLM Backend Traits
//!
//! Trait definitions for the generation backend. The gateway performs exactly
//! one kind of upstream call: submit a prompt and read the incremental reply
//! as newline-delimited text. Everything provider-specific (URL layout,
//! request body, status handling) lives behind [`LlmBackend`].

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::UpstreamError;

/// Highest sampling temperature passed upstream
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Lazy sequence of raw lines read from one upstream response
///
/// Finite and non-restartable. Dropping it releases the underlying
/// connection, which is how a cancelled caller frees upstream resources.
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String, UpstreamError>> + Send>>;

/// A single generation request
#[derive(Clone, Debug)]
pub struct LlmRequest {
    /// The prompt to send
    pub prompt: String,
    /// Model to use (backend-specific identifier)
    pub model: String,
    /// Whether to ask for incremental output
    pub stream: bool,
    /// System prompt (optional)
    pub system: Option<String>,
    /// Sampling temperature; backend default when unset
    pub temperature: Option<f32>,
}

impl Default for LlmRequest {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            model: String::new(),
            stream: true,
            system: None,
            temperature: None,
        }
    }
}

impl LlmRequest {
    /// Create a new streaming request with prompt and model
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set streaming mode
    #[must_use]
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set temperature, kept within `0.0..=MAX_TEMPERATURE`
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, MAX_TEMPERATURE));
        self
    }

    /// Set system prompt
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// LLM Backend trait
///
/// Implement this to point the gateway at a different streaming provider.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Get the backend name (e.g., "Ollama")
    fn name(&self) -> &str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Open a streaming call and return its body as raw lines
    ///
    /// Fails if the call cannot be established or the backend rejects it.
    /// Errors after the first byte arrives are yielded through the stream.
    async fn stream_lines(&self, request: &LlmRequest) -> Result<LineStream, UpstreamError>;
}
