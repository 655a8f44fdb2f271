//! Stub backend and server helpers for route and socket tests

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;

use gateway_core::{
    Gateway, GatewayConfig, LineStream, LlmBackend, LlmRequest, StreamChunk, UpstreamError,
};

/// Answers without any network
///
/// - `hi` streams `He` + `llo`
/// - `fail` is rejected with a 503
/// - `hang` opens a stream that never yields
/// - anything else is echoed back as `echo: <prompt>`
pub struct StubBackend {
    reachable: bool,
}

impl StubBackend {
    pub fn new() -> Self {
        Self { reachable: true }
    }

    pub fn unreachable() -> Self {
        Self { reachable: false }
    }
}

#[async_trait]
impl LlmBackend for StubBackend {
    fn name(&self) -> &str {
        "Stub"
    }

    async fn health_check(&self) -> bool {
        self.reachable
    }

    async fn stream_lines(&self, request: &LlmRequest) -> Result<LineStream, UpstreamError> {
        let chunks = match request.prompt.as_str() {
            "fail" => {
                return Err(UpstreamError::Status {
                    status: 503,
                    body: "model is loading".to_string(),
                })
            }
            "hang" => {
                return Ok(Box::pin(stream::pending::<Result<String, UpstreamError>>()));
            }
            "hi" => vec![StreamChunk::new("He", false), StreamChunk::new("llo", true)],
            prompt => vec![
                StreamChunk::new("echo: ", false),
                StreamChunk::new(prompt, true),
            ],
        };
        let lines: Vec<Result<String, UpstreamError>> =
            chunks.iter().map(|chunk| Ok(chunk.to_line())).collect();
        Ok(Box::pin(stream::iter(lines)))
    }
}

pub fn gateway(backend: StubBackend) -> Gateway<StubBackend> {
    Gateway::new(Arc::new(backend), &GatewayConfig::default())
}

pub fn echo_gateway() -> Gateway<StubBackend> {
    gateway(StubBackend::new())
}

/// Echo gateway whose socket sessions queue at most `capacity` messages
pub fn queue_gateway(capacity: usize) -> Gateway<StubBackend> {
    let mut config = GatewayConfig::default();
    config.server.session_queue_capacity = capacity;
    Gateway::new(Arc::new(StubBackend::new()), &config)
}

/// Serve the full router on an ephemeral local port
pub async fn spawn_server(gateway: Gateway<StubBackend>) -> SocketAddr {
    let app = crate::server::build_router(gateway);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
