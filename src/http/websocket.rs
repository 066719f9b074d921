//! Client WebSocket endpoint.
//!
//! # Responsibilities
//! - Complete the upgrade handshake on `GET /ws`
//! - Register the connection for broadcasts for its whole lifetime
//! - Answer `PING` probes with `PONG`
//! - Feed replies into the shared reply collector
//!
//! # Data Flow
//! ```text
//!                   ┌──────────── writer task ◀── mpsc ◀── Publisher / PONG
//! Client ◀──────────┤
//!        ──────────▶└──────────── read loop ──▶ Inbound::parse ──▶ ReplyCollector
//! ```
//!
//! # Design Decisions
//! - One writer task per socket owns the sink; everyone else enqueues
//! - Malformed frames are dropped and the connection stays open
//! - Deregistration happens through a drop guard when the read loop ends

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::bridge::protocol::{Inbound, PONG};
use crate::bridge::registry::OUTBOUND_CAPACITY;
use crate::bridge::{ClientHandle, ConnectionId, ConnectionRegistry, ReplyCollector};
use crate::http::server::AppState;

/// GET /ws
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    let registry = Arc::clone(&state.registry);
    let collector = state.engine.collector().clone();
    ws.on_upgrade(move |socket| run_connection(socket, remote_addr, registry, collector))
}

/// Serve one client until its socket closes.
pub async fn run_connection(
    socket: WebSocket,
    remote_addr: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    collector: ReplyCollector,
) {
    let (sink, mut stream) = socket.split();
    let (tx, rx) = mpsc::channel::<Message>(OUTBOUND_CAPACITY);

    let registration = registry.register(ClientHandle::new(remote_addr, tx.clone()));
    let connection_id = registration.id();
    let writer = tokio::spawn(writer_task(sink, rx, connection_id, remote_addr));

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => handle_text(text.as_str(), &tx, &collector, connection_id),
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => handle_text(text, &tx, &collector, connection_id),
                Err(_) => {
                    tracing::debug!(connection_id = %connection_id, "Dropping non-UTF-8 binary frame");
                }
            },
            Ok(Message::Close(_)) => break,
            // Protocol-level ping/pong is answered by the transport.
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "Client socket error");
                break;
            }
        }
    }

    // Removing the registry's sender and ours lets the writer drain and exit.
    drop(registration);
    drop(tx);
    let _ = writer.await;
}

fn handle_text(
    text: &str,
    outbound: &mpsc::Sender<Message>,
    collector: &ReplyCollector,
    connection_id: ConnectionId,
) {
    match Inbound::parse(text) {
        Ok(Inbound::Ping) => {
            if outbound.try_send(Message::Text(PONG.into())).is_err() {
                tracing::debug!(connection_id = %connection_id, "Outbound queue unavailable, PONG dropped");
            }
        }
        Ok(Inbound::Reply(reply)) => {
            tracing::debug!(
                connection_id = %connection_id,
                message_id = %reply.id,
                command = %reply.command_name,
                "Reply received"
            );
            collector.collect(reply);
        }
        Err(e) => {
            tracing::debug!(connection_id = %connection_id, error = %e, "Dropping malformed client message");
        }
    }
}

async fn writer_task(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Message>,
    connection_id: ConnectionId,
    remote_addr: SocketAddr,
) {
    while let Some(message) = rx.recv().await {
        if let Err(e) = sink.send(message).await {
            tracing::debug!(
                connection_id = %connection_id,
                remote_addr = %remote_addr,
                error = %e,
                "Client write failed"
            );
            return;
        }
    }
    let _ = sink.close().await;
}
