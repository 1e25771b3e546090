//! WebSocket endpoint streaming live telemetry to browser clients.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::feed::StreamFrame;
use crate::state::AppState;

/// Interval between keep-alive pings.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// HTTP handler that upgrades the connection to WebSocket.
///
/// Each connection gets its own receiver on the telemetry feed, so
/// clients are fanned out independently and a slow client only loses
/// its own frames.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.feed.subscribe()))
}

/// Manage a single connection after upgrade.
///
/// A spawned sender task forwards feed frames (plus periodic pings);
/// the current task drains inbound traffic until the client goes away.
async fn handle_socket(socket: WebSocket, mut feed: broadcast::Receiver<StreamFrame>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "Dashboard client connected");

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        loop {
            tokio::select! {
                frame = feed.recv() => match frame {
                    Ok(frame) => {
                        let text = serde_json::to_string(&frame)
                            .expect("StreamFrame is always serialisable");
                        if sink.send(Message::Text(text.into())).await.is_err() {
                            tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            conn_id = %sender_conn_id,
                            skipped,
                            "Client lagging, frames dropped",
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = heartbeat.tick() => {
                    if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Inbound traffic: only lifecycle frames matter.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    send_task.abort();
    tracing::info!(conn_id = %conn_id, "Dashboard client disconnected");
}
