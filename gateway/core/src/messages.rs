//! Gateway Messages
//!
//! Payloads exchanged with clients on both transports.
//!
//! # Synchronous call
//!
//! ```text
//! request:  {"user": "u1", "message": "hi"}
//! success:  {"message": "Hello", "user": "llm"}
//! failure:  {"error": "upstream request failed: ..."}
//! ```
//!
//! # Socket events
//!
//! Every frame is `{"event": <name>, "data": <payload>}`. Clients may also
//! send the socket.io array form `[<name>, <payload>]`.
//!
//! ```text
//! server → client  connection_confirmed  {"status": "connected", "sid": "..."}
//! client → server  chat_message          {"user": "u1", "message": "hi"}
//! server → client  chat_response         {"user": "llm" | "system", "message": "..."}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UpstreamError;
use crate::session::SessionId;

/// Placeholder sender for requests that omit `user`
pub const ANONYMOUS_USER: &str = "anonymous";

/// Who produced an outbound message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The generation backend
    Llm,
    /// The gateway itself (errors)
    System,
}

/// An inbound chat request
///
/// Immutable once received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    /// Client-supplied sender name
    #[serde(rename = "user")]
    pub sender: String,
    /// Prompt text
    #[serde(rename = "message")]
    pub text: String,
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            sender: ANONYMOUS_USER.to_string(),
            text: String::new(),
        }
    }
}

impl ChatRequest {
    /// Create a request
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
        }
    }

    /// Build a request from an untrusted JSON payload
    ///
    /// Absent or non-string fields fall back to defaults; nothing is rejected.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        let field = |name: &str| payload.get(name).and_then(Value::as_str).map(String::from);
        Self {
            sender: field("user").unwrap_or_else(|| ANONYMOUS_USER.to_string()),
            text: field("message").unwrap_or_default(),
        }
    }

    /// Build a request from a raw request body
    ///
    /// A body that is not JSON is treated like an empty object.
    #[must_use]
    pub fn from_body(body: &[u8]) -> Self {
        let payload = serde_json::from_slice::<Value>(body).unwrap_or(Value::Null);
        Self::from_payload(&payload)
    }
}

/// The single answer produced for one [`ChatRequest`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregatedResponse {
    /// `Llm` on success, `System` when carrying an error description
    pub sender: Speaker,
    /// Full text
    pub text: String,
}

impl AggregatedResponse {
    /// Successful answer
    pub fn llm(text: impl Into<String>) -> Self {
        Self {
            sender: Speaker::Llm,
            text: text.into(),
        }
    }

    /// Error-bearing substitute for an answer
    #[must_use]
    pub fn failure(error: &UpstreamError) -> Self {
        Self {
            sender: Speaker::System,
            text: format!("Error: {error}"),
        }
    }

    /// Whether this carries an error
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.sender == Speaker::System
    }
}

/// Result of the synchronous entry point
///
/// Both shapes travel with the same status; clients tell them apart by the
/// presence of `error`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatReply {
    /// Aggregated answer
    Success {
        /// Full text
        message: String,
        /// Always `llm`
        user: Speaker,
    },
    /// Upstream failure description
    Failure {
        /// Non-empty error text
        error: String,
    },
}

impl ChatReply {
    /// Successful reply
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
            user: Speaker::Llm,
        }
    }

    /// Failure reply
    #[must_use]
    pub fn failure(error: &UpstreamError) -> Self {
        Self::Failure {
            error: error.to_string(),
        }
    }
}

/// Status marker sent in `connection_confirmed`
pub const STATUS_CONNECTED: &str = "connected";

/// Events pushed from the gateway to one socket session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// Sent once, right after the session is registered
    ConnectionConfirmed {
        /// Always `connected`
        status: String,
        /// Identifier assigned to the session
        sid: SessionId,
    },
    /// Answer (or error) for a `chat_message`
    ChatResponse {
        /// `llm` or `system`
        user: Speaker,
        /// Full text
        message: String,
    },
}

impl GatewayEvent {
    /// Acknowledgment for a fresh session
    #[must_use]
    pub fn connection_confirmed(sid: &SessionId) -> Self {
        Self::ConnectionConfirmed {
            status: STATUS_CONNECTED.to_string(),
            sid: sid.clone(),
        }
    }
}

impl From<AggregatedResponse> for GatewayEvent {
    fn from(response: AggregatedResponse) -> Self {
        Self::ChatResponse {
            user: response.sender,
            message: response.text,
        }
    }
}

/// Name of the inbound chat event
pub const CHAT_MESSAGE_EVENT: &str = "chat_message";

/// Events received from a socket client
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientEvent {
    /// A prompt to answer
    ChatMessage(ChatRequest),
}

impl ClientEvent {
    /// Parse one text frame
    ///
    /// Returns `None` for frames that are not JSON or name an unknown event.
    #[must_use]
    pub fn parse(frame: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(frame).ok()?;

        let (event, data) = match &value {
            Value::Object(map) => (map.get("event")?.as_str()?, map.get("data")),
            Value::Array(items) => (items.first()?.as_str()?, items.get(1)),
            _ => return None,
        };

        match event {
            CHAT_MESSAGE_EVENT => Some(Self::ChatMessage(ChatRequest::from_payload(
                data.unwrap_or(&Value::Null),
            ))),
            _ => None,
        }
    }
}
