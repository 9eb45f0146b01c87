use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::protocol;
use crate::state::AppState;
use crate::ws::{ClientId, RegistryError};

/// Run the actor-per-connection pattern for a relay client.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards messages from an mpsc channel
/// - Reader loop: drives the session, relaying each inbound text frame
///
/// The mpsc channel allows any part of the system to send messages to this
/// client by cloning the sender; the registry holds one such clone.
pub async fn run_connection(socket: WebSocket, state: AppState, client_id: ClientId) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    // Register this connection in the connection registry
    state.connections.register(client_id, tx.clone());

    tracing::info!(
        client_id,
        active = state.connections.len(),
        "WebSocket session started"
    );

    // Spawn writer task: forwards mpsc messages to the WebSocket sink
    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Announce the newcomer to everyone else
    if let Err(e) = state
        .connections
        .broadcast(&protocol::join_notice(client_id), &[client_id])
    {
        tracing::warn!(client_id, error = %e, "Join broadcast failed");
    }

    // Reader loop: each inbound text frame triggers one echo and one fan-out
    loop {
        match ws_receiver.next().await {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => {
                    if let Err(e) = relay_text(&state, client_id, text.as_str()) {
                        // Aborts this session only; other connections are unaffected
                        tracing::warn!(client_id, error = %e, "Relay failed, closing session");
                        break;
                    }
                }
                Message::Binary(_) => {
                    tracing::debug!(client_id, "Ignoring binary frame on text relay");
                }
                Message::Ping(data) => {
                    // Respond to client pings with pong
                    let _ = tx.send(Message::Pong(data));
                }
                Message::Pong(_) => {}
                Message::Close(frame) => {
                    tracing::info!(client_id, reason = ?frame, "Client initiated close");
                    break;
                }
            },
            Some(Err(e)) => {
                tracing::warn!(client_id, error = %e, "WebSocket receive error");
                break;
            }
            None => {
                // Stream ended — client disconnected
                tracing::info!(client_id, "WebSocket stream ended");
                break;
            }
        }
    }

    // Cleanup: abort the writer task
    writer_handle.abort();

    // Unregister runs once per session; a NotFound here means the entry was
    // already gone and there is nothing left to announce.
    match state.connections.unregister(client_id) {
        Ok(()) => {
            if let Err(e) = state
                .connections
                .broadcast(&protocol::leave_notice(client_id), &[])
            {
                tracing::warn!(client_id, error = %e, "Leave broadcast failed");
            }
        }
        Err(e) => {
            tracing::debug!(client_id, error = %e, "Connection already unregistered");
        }
    }

    tracing::info!(client_id, "WebSocket session ended");
}

/// Echo the message back to its author, then fan it out to everyone else.
/// A `NotFound` on the echo path propagates rather than being swallowed.
fn relay_text(state: &AppState, client_id: ClientId, text: &str) -> Result<(), RegistryError> {
    state
        .connections
        .unicast(client_id, &protocol::echo_reply(text))?;
    state
        .connections
        .broadcast(&protocol::relay_notice(client_id, text), &[client_id])
}

/// Writer task: receives messages from the mpsc channel and forwards them to
/// the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed — connection is broken
            break;
        }
    }
}
