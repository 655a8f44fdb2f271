//! Response Aggregator
//!
//! Folds one upstream line stream into a single answer.
//!
//! ```text
//!   {"response":"He","done":false}   ──►  "He"
//!   garbage                          ──►  (skipped)
//!   {"response":"llo","done":true}   ──►  "Hello"  ── stop
//! ```
//!
//! Folding stops at the first chunk with `done == true` (its fragment is
//! included) or when the stream runs out. A transport error aborts the fold
//! and discards whatever had been accumulated.

use std::sync::Arc;

use futures::{Stream, StreamExt};

use crate::backend::{LlmBackend, LlmRequest};
use crate::config::UpstreamConfig;
use crate::error::UpstreamError;
use crate::streaming::{DecodedLine, StreamChunk};

/// Characters of the answer included in the completion log line
const PREVIEW_CHARS: usize = 100;

/// How a successful fold ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// A chunk carried `done: true`
    Done,
    /// The stream closed without a `done` chunk
    Exhausted,
}

/// Result of folding one stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aggregation {
    /// Concatenated fragments in arrival order
    pub text: String,
    /// How folding stopped
    pub completion: Completion,
    /// Number of chunks folded, including empty ones
    pub fragments: usize,
    /// Lines that were not chunks
    pub skipped_lines: usize,
}

/// Fold a line stream into one [`Aggregation`]
///
/// Lines after the terminal chunk are never read; dropping the stream on
/// return releases the upstream connection.
pub async fn fold_lines<S>(mut lines: S) -> Result<Aggregation, UpstreamError>
where
    S: Stream<Item = Result<String, UpstreamError>> + Unpin,
{
    let mut text = String::new();
    let mut fragments = 0;
    let mut skipped_lines = 0;

    while let Some(line) = lines.next().await {
        match StreamChunk::decode(&line?) {
            DecodedLine::Blank => {}
            DecodedLine::Malformed => skipped_lines += 1,
            DecodedLine::Chunk(chunk) => {
                text.push_str(&chunk.fragment);
                fragments += 1;
                if chunk.done {
                    return Ok(Aggregation {
                        text,
                        completion: Completion::Done,
                        fragments,
                        skipped_lines,
                    });
                }
            }
        }
    }

    Ok(Aggregation {
        text,
        completion: Completion::Exhausted,
        fragments,
        skipped_lines,
    })
}

/// Drives one backend call per prompt and folds the reply
pub struct ResponseAggregator<B> {
    backend: Arc<B>,
    model: String,
    system: Option<String>,
    temperature: Option<f32>,
}

impl<B: LlmBackend> ResponseAggregator<B> {
    /// Create an aggregator using `model` and no extra options
    pub fn new(backend: Arc<B>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            system: None,
            temperature: None,
        }
    }

    /// Create an aggregator from upstream configuration
    pub fn from_config(backend: Arc<B>, config: &UpstreamConfig) -> Self {
        Self {
            backend,
            model: config.model.clone(),
            system: config.system_prompt.clone(),
            temperature: config.temperature,
        }
    }

    /// Model name sent upstream
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The backend in use
    #[must_use]
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn request(&self, prompt: &str) -> LlmRequest {
        let mut request = LlmRequest::new(prompt, &self.model);
        if let Some(system) = &self.system {
            request = request.with_system(system);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }

    /// Produce the complete answer for `prompt`
    ///
    /// Opens exactly one upstream stream. No retries.
    pub async fn aggregate(&self, prompt: &str) -> Result<Aggregation, UpstreamError> {
        let request = self.request(prompt);
        let lines = self.backend.stream_lines(&request).await?;

        let aggregation = match fold_lines(lines).await {
            Ok(aggregation) => aggregation,
            Err(e) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    error = %e,
                    "Upstream stream failed"
                );
                return Err(e);
            }
        };

        let preview: String = aggregation.text.chars().take(PREVIEW_CHARS).collect();
        tracing::info!(
            backend = self.backend.name(),
            model = %self.model,
            fragments = aggregation.fragments,
            skipped = aggregation.skipped_lines,
            completion = ?aggregation.completion,
            preview = %preview,
            "Aggregated response"
        );

        Ok(aggregation)
    }
}
