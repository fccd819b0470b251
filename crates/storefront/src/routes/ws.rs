//! `GET /ws` - realtime product list channel.
//!
//! Each connection gets a snapshot immediately, then every snapshot the hub
//! publishes. Client events reuse the catalog operations behind the REST
//! API, so their broadcasts reach every client including the sender.
//! Replies to `refreshProducts` and errors go to the requester only.

use std::time::Duration;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::realtime::{ClientEvent, ServerEvent};
use crate::state::AppState;

/// Largest accepted client frame.
const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Keep-alive ping interval.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket upgrade handler.
pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handles a WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    let _client = state.hub().connect();
    info!(%client_id, clients = state.hub().client_count(), "Realtime client connected");

    let (mut sender, mut receiver) = socket.split();

    // Subscribe before the snapshot so no mutation falls in between
    let mut broadcast_rx = state.hub().subscribe();

    let snapshot = snapshot_or_error(&state).await;
    if let Err(e) = send_event(&mut sender, &snapshot).await {
        warn!(%client_id, ?e, "Failed to send initial snapshot");
        return;
    }

    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<Message>(64);

    // Outgoing message task
    let outgoing_handle = tokio::spawn(async move {
        while let Some(msg) = outgoing_rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Broadcast forwarding task
    let outgoing_tx_broadcast = outgoing_tx.clone();
    let broadcast_handle = tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(event) => {
                    let Some(msg) = encode(&event) else { continue };
                    if outgoing_tx_broadcast.send(msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(%client_id, skipped, "Broadcast receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Ping task
    let outgoing_tx_ping = outgoing_tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_interval = interval(PING_INTERVAL);
        // The first tick completes immediately
        ping_interval.tick().await;
        loop {
            ping_interval.tick().await;
            if outgoing_tx_ping
                .send(Message::Ping(axum::body::Bytes::new()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    // Main receive loop
    while let Some(result) = receiver.next().await {
        let msg = match result {
            Ok(msg) => msg,
            Err(e) => {
                warn!(%client_id, ?e, "WebSocket error");
                break;
            }
        };

        let reply = match msg {
            Message::Text(text) => handle_text(&state, &text).await,
            Message::Binary(data) => match std::str::from_utf8(&data) {
                Ok(text) => handle_text(&state, text).await,
                Err(_) => Some(error_event("binary frames must be UTF-8 JSON")),
            },
            Message::Ping(data) => {
                let _ = outgoing_tx.send(Message::Pong(data)).await;
                None
            }
            Message::Pong(_) => None,
            Message::Close(_) => {
                debug!(%client_id, "Client requested close");
                break;
            }
        };

        if let Some(event) = reply
            && let Some(msg) = encode(&event)
            && outgoing_tx.send(msg).await.is_err()
        {
            break;
        }
    }

    // Cleanup
    ping_handle.abort();
    broadcast_handle.abort();
    outgoing_handle.abort();
    info!(%client_id, "Realtime client disconnected");
}

/// Parse and run a client event, returning the reply for the requester.
async fn handle_text(state: &AppState, text: &str) -> Option<ServerEvent> {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => handle_client_event(state, event).await,
        Err(e) => {
            debug!(?e, "Invalid client message");
            Some(error_event(&format!("invalid message: {e}")))
        }
    }
}

/// Run a client event. Successful mutations reply through the broadcast.
async fn handle_client_event(state: &AppState, event: ClientEvent) -> Option<ServerEvent> {
    let result = match event {
        ClientEvent::CreateProduct { product } => {
            state.catalog().create(product).await.map(|_| None)
        }
        ClientEvent::DeleteProduct { id } => state.catalog().delete(id).await.map(|_| None),
        ClientEvent::RefreshProducts => state.catalog().snapshot().await.map(Some),
    };

    result.unwrap_or_else(|e| {
        if e.is_server_error() {
            warn!(error = %e, "Realtime request failed");
        }
        Some(error_event(&e.client_message()))
    })
}

async fn snapshot_or_error(state: &AppState) -> ServerEvent {
    match state.catalog().snapshot().await {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Failed to load products for snapshot");
            error_event(&e.client_message())
        }
    }
}

fn error_event(message: &str) -> ServerEvent {
    ServerEvent::Error {
        message: message.to_string(),
    }
}

fn encode(event: &ServerEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            warn!(?e, "Failed to encode realtime event");
            None
        }
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    match encode(event) {
        Some(msg) => sender.send(msg).await,
        None => Ok(()),
    }
}
