//! Gateway Front Door
//!
//! Both transports end up here. The synchronous entry ([`Gateway::chat`])
//! replies through the open call and never touches the session registry.
//! The push-style entry ([`Gateway::handle_message`]) aggregates and then
//! looks the session up again, so a client that left in the meantime turns
//! the delivery into a no-op.
//!
//! # Socket Session Lifecycle
//!
//! ```text
//!  connect ──► register + connection_confirmed
//!     │
//!     ▼
//!  spawn_session_worker ──► queue ──► handle_message ──► chat_response
//!     │                    (serial: one upstream call at a time)
//!     ▼
//!  disconnect ──► unregister (in-flight call finishes, delivery dropped)
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::aggregator::ResponseAggregator;
use crate::backend::LlmBackend;
use crate::config::{GatewayConfig, ServerConfig};
use crate::error::SessionError;
use crate::messages::{AggregatedResponse, ChatReply, ChatRequest, GatewayEvent};
use crate::session::{Session, SessionId, SessionRegistry, TransportKind};

/// Outcome of delivering one push-style answer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The event was queued for the session's writer
    Delivered,
    /// The session disconnected before the answer was ready
    SessionGone,
    /// The session is registered but its writer has stopped
    ChannelClosed,
}

/// Snapshot returned by [`Gateway::health`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Backend display name
    pub backend: String,
    /// Model every request is sent to
    pub model: String,
    /// Whether the backend answered a probe
    pub upstream_reachable: bool,
    /// Live socket sessions
    pub sessions: usize,
}

/// Entry points shared by all transports
pub struct Gateway<B> {
    aggregator: Arc<ResponseAggregator<B>>,
    registry: SessionRegistry,
    server: ServerConfig,
}

impl<B> Clone for Gateway<B> {
    fn clone(&self) -> Self {
        Self {
            aggregator: Arc::clone(&self.aggregator),
            registry: self.registry.clone(),
            server: self.server.clone(),
        }
    }
}

impl<B: LlmBackend + 'static> Gateway<B> {
    /// Create a gateway around `backend`
    pub fn new(backend: Arc<B>, config: &GatewayConfig) -> Self {
        Self {
            aggregator: Arc::new(ResponseAggregator::from_config(backend, &config.upstream)),
            registry: SessionRegistry::new(),
            server: config.server.clone(),
        }
    }

    /// The session registry
    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Listener and queue settings
    #[must_use]
    pub fn server_config(&self) -> &ServerConfig {
        &self.server
    }

    /// Produce exactly one response for `prompt`
    ///
    /// Upstream failures become a `system` response; nothing is raised.
    pub async fn respond(&self, prompt: &str) -> AggregatedResponse {
        match self.aggregator.aggregate(prompt).await {
            Ok(aggregation) => AggregatedResponse::llm(aggregation.text),
            Err(e) => AggregatedResponse::failure(&e),
        }
    }

    /// Synchronous entry point
    pub async fn chat(&self, request: ChatRequest) -> ChatReply {
        tracing::debug!(
            transport = %TransportKind::Http,
            user = %request.sender,
            "Chat request received"
        );
        match self.aggregator.aggregate(&request.text).await {
            Ok(aggregation) => ChatReply::success(aggregation.text),
            Err(e) => {
                tracing::warn!(error = %e, "Chat request failed");
                ChatReply::failure(&e)
            }
        }
    }

    /// Register a new socket session and acknowledge it
    pub async fn connect(
        &self,
        outbound: mpsc::Sender<GatewayEvent>,
    ) -> Result<Session, SessionError> {
        let session = self
            .registry
            .register(SessionId::generate(), TransportKind::Socket, outbound)?;
        if !session
            .send(GatewayEvent::connection_confirmed(&session.id))
            .await
        {
            tracing::debug!(session_id = %session.id, "Writer closed before acknowledgment");
        }
        Ok(session)
    }

    /// Drop a socket session
    ///
    /// Running aggregations for it are left to finish.
    pub fn disconnect(&self, id: &SessionId) {
        self.registry.unregister(id);
    }

    /// Push-style entry point
    ///
    /// Answers `request` and delivers the result to session `id` only.
    pub async fn handle_message(&self, id: &SessionId, request: ChatRequest) -> Delivery {
        tracing::debug!(
            session_id = %id,
            user = %request.sender,
            "Chat message received"
        );

        let response = self.respond(&request.text).await;
        if response.is_failure() {
            tracing::warn!(session_id = %id, error = %response.text, "Chat message failed");
        }

        let Some(session) = self.registry.lookup(id) else {
            tracing::debug!(session_id = %id, "Session gone, dropping response");
            return Delivery::SessionGone;
        };
        if session.send(response.into()).await {
            Delivery::Delivered
        } else {
            tracing::debug!(session_id = %id, "Session writer closed, dropping response");
            Delivery::ChannelClosed
        }
    }

    /// Start the task that answers one session's messages in order
    ///
    /// The returned sender is the session's inbound queue. The task ends when
    /// the sender is dropped or the session is no longer registered.
    pub fn spawn_session_worker(&self, id: SessionId) -> mpsc::Sender<ChatRequest> {
        let (tx, mut rx) = mpsc::channel::<ChatRequest>(self.server.session_queue_capacity);
        let gateway = self.clone();

        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                if !gateway.registry.contains(&id) {
                    break;
                }
                match gateway.handle_message(&id, request).await {
                    Delivery::Delivered => {}
                    Delivery::SessionGone | Delivery::ChannelClosed => break,
                }
            }
            tracing::debug!(session_id = %id, "Session worker stopped");
        });

        tx
    }

    /// Probe the backend and report live sessions
    pub async fn health(&self) -> HealthReport {
        let backend = self.aggregator.backend();
        HealthReport {
            backend: backend.name().to_string(),
            model: self.aggregator.model().to_string(),
            upstream_reachable: backend.health_check().await,
            sessions: self.registry.count(),
        }
    }
}
