//! Gateway Core - Streaming-Response Aggregation for the Chat Gateway
//!
//! This crate turns an incremental, newline-delimited JSON reply from a
//! generation backend into one complete answer, and routes that answer back
//! to the client that asked for it. It has no HTTP server of its own; the
//! daemon crate wires the entry points to real transports.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Transports                             │
//! │     POST /chat (synchronous)            /ws (push-style)         │
//! └──────────────┬───────────────────────────────────┬───────────────┘
//!                │ ChatRequest                       │ ClientEvent
//! ┌──────────────▼───────────────────────────────────▼───────────────┐
//! │                         GATEWAY CORE                             │
//! │  ┌────────────────────────────────────────────────────────────┐  │
//! │  │                        Gateway                             │  │
//! │  │   chat()            handle_message()      SessionRegistry  │  │
//! │  └─────────┬──────────────────┬───────────────────────────────┘  │
//! │            └────────┬─────────┘                                  │
//! │            ┌────────▼──────────┐    ┌──────────────────────────┐ │
//! │            │ ResponseAggregator│◄───│ LineDecoder / StreamChunk│ │
//! │            └────────┬──────────┘    └──────────────────────────┘ │
//! └─────────────────────┼────────────────────────────────────────────┘
//!                       │ POST /api/generate (stream: true)
//!                 ┌─────▼─────┐
//!                 │  Ollama   │
//!                 └───────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use gateway_core::{ChatRequest, Gateway, GatewayConfig, OllamaBackend};
//!
//! let config = GatewayConfig::default();
//! let backend = Arc::new(OllamaBackend::from_config(&config.upstream)?);
//! let gateway = Gateway::new(backend, &config);
//!
//! let reply = gateway.chat(ChatRequest::new("u1", "hi")).await;
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: LLM backend abstraction and the Ollama client
//! - [`streaming`]: Byte-to-line framing and per-line chunk decoding
//! - [`aggregator`]: Folding a line stream into one answer
//! - [`session`]: Registry of live push-style sessions
//! - [`messages`]: Client-facing payloads and events
//! - [`gateway`]: Entry points used by the transports
//! - [`config`]: File, environment and CLI configuration
//! - [`error`]: Error types

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod messages;
pub mod session;
pub mod streaming;

pub use aggregator::{fold_lines, Aggregation, Completion, ResponseAggregator};
pub use backend::{LineStream, LlmBackend, LlmRequest, OllamaBackend, MAX_TEMPERATURE};
pub use error::{SessionError, UpstreamError};
pub use gateway::{Delivery, Gateway, HealthReport};
pub use messages::{
    AggregatedResponse, ChatReply, ChatRequest, ClientEvent, GatewayEvent, Speaker,
};
pub use session::{Session, SessionId, SessionRegistry, TransportKind};
pub use streaming::{ndjson_lines, DecodedLine, LineDecoder, StreamChunk};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with_env,
    ConfigError, ConfigOverrides, ConfigSource, GatewayConfig, ServerConfig, UpstreamConfig,
};
