//! WebSocket Session Loop
//!
//! Each upgraded socket becomes one push-style session:
//!
//! ```text
//!   socket read half ──► ClientEvent::parse ──► session queue ──► worker
//!                                                                  │
//!   socket write half ◄── writer task ◄── outbound channel ◄───────┘
//! ```
//!
//! Close frames and read errors both count as a disconnect. Ping, pong and
//! binary frames are ignored.
//!
//! The read loop never waits on the session queue. A message that arrives
//! while the queue is full is refused with a `system` event, so a Close frame
//! is always read promptly.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, error::TrySendError};

use gateway_core::{ClientEvent, Gateway, GatewayEvent, LlmBackend, Speaker};

/// Text of the event sent when a message is refused
pub const QUEUE_FULL_MESSAGE: &str = "Error: too many messages awaiting an answer";

/// Run one socket session until the client goes away
pub async fn serve_session<B: LlmBackend + 'static>(socket: WebSocket, gateway: Gateway<B>) {
    let (mut sink, mut frames) = socket.split();
    let (outbound_tx, mut outbound_rx) =
        mpsc::channel::<GatewayEvent>(gateway.server_config().outbound_capacity);

    let writer = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to encode event");
                    continue;
                }
            };
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let session = match gateway.connect(outbound_tx).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to register socket session");
            writer.abort();
            return;
        }
    };
    let id = session.id.clone();
    let queue = gateway.spawn_session_worker(id.clone());

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Message::Text(text)) => match ClientEvent::parse(text.as_str()) {
                Some(ClientEvent::ChatMessage(request)) => match queue.try_send(request) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(session_id = %id, "Session queue full, refusing message");
                        let refused = GatewayEvent::ChatResponse {
                            user: Speaker::System,
                            message: QUEUE_FULL_MESSAGE.to_string(),
                        };
                        if !session.try_send(refused) {
                            tracing::debug!(session_id = %id, "Outbound queue full, refusal dropped");
                        }
                    }
                    Err(TrySendError::Closed(_)) => break,
                },
                None => {
                    tracing::debug!(session_id = %id, "Ignoring unrecognized frame");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(session_id = %id, error = %e, "Socket read failed");
                break;
            }
        }
    }

    gateway.disconnect(&id);
    drop(queue);
    drop(session);
    let _ = writer.await;
}
