//! LLM Backend Integration
//!
//! The generation service is treated as an opaque streaming HTTP endpoint.
//! [`LlmBackend`] hides the provider; [`OllamaBackend`] is the one shipped.
//!
//! # Usage
//!
//! ```ignore
//! use gateway_core::backend::{OllamaBackend, LlmBackend, LlmRequest};
//!
//! let backend = OllamaBackend::new("http://localhost:11434")?;
//! let request = LlmRequest::new("Hello!", "tinyllama");
//! let lines = backend.stream_lines(&request).await?;
//! ```

mod ollama;
mod traits;

pub use ollama::OllamaBackend;
pub use traits::{LineStream, LlmBackend, LlmRequest, MAX_TEMPERATURE};
