//! HTTP Routes
//!
//! ```text
//! GET  /        liveness probe, fixed payload
//! GET  /health  upstream reachability and live session count
//! POST /chat    synchronous chat, always 200 with a ChatReply
//! GET  /ws      WebSocket upgrade into a push-style session
//! ```

use axum::body::Bytes;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use gateway_core::{ChatReply, ChatRequest, Gateway, LlmBackend};

use crate::socket;

/// Fixed liveness payload
#[derive(Debug, Serialize)]
struct Liveness {
    message: &'static str,
}

/// Body of `GET /health`
#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    backend: String,
    model: String,
    upstream: &'static str,
    sessions: usize,
}

/// Build the application router around `gateway`
pub fn build_router<B: LlmBackend + 'static>(gateway: Gateway<B>) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(health::<B>))
        .route("/chat", post(chat::<B>))
        .route("/ws", get(ws_upgrade::<B>))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

async fn liveness() -> Json<Liveness> {
    Json(Liveness {
        message: "Server is working",
    })
}

async fn health<B: LlmBackend + 'static>(State(gateway): State<Gateway<B>>) -> Json<HealthBody> {
    let report = gateway.health().await;
    Json(HealthBody {
        status: "ok",
        backend: report.backend,
        model: report.model,
        upstream: if report.upstream_reachable {
            "reachable"
        } else {
            "unreachable"
        },
        sessions: report.sessions,
    })
}

/// The body is read raw so that malformed JSON falls back to defaults
/// instead of being rejected by the extractor.
async fn chat<B: LlmBackend + 'static>(
    State(gateway): State<Gateway<B>>,
    body: Bytes,
) -> Json<ChatReply> {
    let request = ChatRequest::from_body(&body);
    Json(gateway.chat(request).await)
}

async fn ws_upgrade<B: LlmBackend + 'static>(
    ws: WebSocketUpgrade,
    State(gateway): State<Gateway<B>>,
) -> Response {
    ws.on_upgrade(move |stream| socket::serve_session(stream, gateway))
}
