//! Session Registry - Push-Style Connection Tracking
//!
//! Push-style clients hold a [`Session`] for the lifetime of their socket.
//! The registry maps each live session id to the channel that delivers
//! events back to that one client.
//!
//! # Architecture
//!
//! ```text
//!                      SessionRegistry
//!                     ┌────────────────────────────────────┐
//!                     │ HashMap<SessionId, Session>        │
//!                     │   - wrapped in Arc<RwLock<>>       │
//!                     └───────────────┬────────────────────┘
//!                                     │ lookup(id)
//!              ┌──────────────────────┼──────────────────────┐
//!       ┌──────▼──────┐       ┌───────▼──────┐       ┌───────▼──────┐
//!       │  socket A   │       │  socket B    │       │  socket C    │
//!       │ mpsc::Sender│       │ mpsc::Sender │       │ mpsc::Sender │
//!       └─────────────┘       └──────────────┘       └──────────────┘
//! ```
//!
//! Synchronous HTTP callers never appear here; the open request is their
//! reply channel.
//!
//! A `lookup` miss is normal: it means the client disconnected while its
//! answer was being produced, and the answer is dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::SessionError;
use crate::messages::GatewayEvent;

/// Identifier of a push-style session
///
/// Unique among currently connected sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random identifier
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Transport a request arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Synchronous request/response
    Http,
    /// Push-style socket
    Socket,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Socket => f.write_str("socket"),
        }
    }
}

/// A live push-style connection
#[derive(Debug, Clone)]
pub struct Session {
    /// Assigned identifier
    pub id: SessionId,
    /// Transport the session runs on
    pub transport: TransportKind,
    /// When the session registered
    pub connected_at: Instant,
    outbound: mpsc::Sender<GatewayEvent>,
}

impl Session {
    /// Deliver an event to this session
    ///
    /// Returns false if the connection's writer has gone away.
    pub async fn send(&self, event: GatewayEvent) -> bool {
        self.outbound.send(event).await.is_ok()
    }

    /// Deliver an event only if the outbound queue has room right now
    ///
    /// Returns false if the queue is full or the writer has gone away.
    pub fn try_send(&self, event: GatewayEvent) -> bool {
        self.outbound.try_send(event).is_ok()
    }
}

/// Registry of live sessions
///
/// Cloning shares the same underlying map.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl SessionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under `id`
    ///
    /// Fails if another live session already holds the id.
    pub fn register(
        &self,
        id: SessionId,
        transport: TransportKind,
        outbound: mpsc::Sender<GatewayEvent>,
    ) -> Result<Session, SessionError> {
        let mut inner = self.inner.write();
        if inner.contains_key(&id) {
            tracing::warn!(session_id = %id, "Rejected duplicate session id");
            return Err(SessionError::DuplicateId(id));
        }

        let session = Session {
            id: id.clone(),
            transport,
            connected_at: Instant::now(),
            outbound,
        };
        inner.insert(id.clone(), session.clone());
        tracing::info!(
            session_id = %id,
            transport = %transport,
            active = inner.len(),
            "Session registered"
        );
        Ok(session)
    }

    /// Remove a session
    ///
    /// Unknown ids are ignored.
    pub fn unregister(&self, id: &SessionId) -> Option<Session> {
        let mut inner = self.inner.write();
        let session = inner.remove(id);
        if let Some(session) = &session {
            tracing::info!(
                session_id = %id,
                uptime_secs = session.connected_at.elapsed().as_secs(),
                "Session unregistered"
            );
        }
        session
    }

    /// Find a live session
    #[must_use]
    pub fn lookup(&self, id: &SessionId) -> Option<Session> {
        self.inner.read().get(id).cloned()
    }

    /// Whether `id` is currently registered
    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool {
        self.inner.read().contains_key(id)
    }

    /// Number of live sessions
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.read().len()
    }
}
