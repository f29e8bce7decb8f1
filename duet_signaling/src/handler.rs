//! Message router and per-connection WebSocket lifecycle
//!
//! Each accepted socket gets one reader loop (this module) and one writer task
//! (see [`crate::connection::write_loop`]). All registry access goes through
//! [`ServerState::lock`], and every send is a non-blocking queue push, so a
//! join and the notification it triggers happen under a single lock.

use crate::connection::{self, Connection, Inbound};
use crate::error::SignalingError;
use crate::protocol::{ClientRequest, RelayKind, ServerEvent};
use crate::state::{ConnectionId, ConnectionState, JoinOutcome, RoomId, ServerState};
use futures_util::StreamExt;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};

/// Apply one parsed request from `sender`
pub fn handle_request(state: &ServerState, sender: ConnectionId, request: ClientRequest) {
    match request {
        ClientRequest::Join { room_id } => handle_join(state, sender, room_id),
        ClientRequest::Relay { kind, raw } => handle_relay(state, sender, kind, &raw),
    }
}

fn handle_join(state: &ServerState, sender: ConnectionId, room_id: RoomId) {
    let mut registry = state.lock();

    match registry.state_of(sender) {
        ConnectionState::Unjoined => {}
        ConnectionState::Closed => return,
        current => {
            debug!(connection = %sender, state = ?current, "ignoring join from joined connection");
            return;
        }
    }

    match registry.join(&room_id, sender) {
        JoinOutcome::RoomFull => {
            info!(connection = %sender, room = %room_id, "room full");
            if let Some(endpoint) = registry.endpoint(sender) {
                endpoint.send(&ServerEvent::RoomFull);
            }
        }
        JoinOutcome::Joined(users) => {
            info!(connection = %sender, room = %room_id, users, "joined room");
            if let Some(endpoint) = registry.endpoint(sender) {
                endpoint.send(&ServerEvent::Joined { users });
            }
            for peer in registry.peers_of(sender) {
                if let Some(endpoint) = registry.endpoint(peer) {
                    endpoint.send(&ServerEvent::UserJoined);
                }
            }
        }
    }
}

fn handle_relay(state: &ServerState, sender: ConnectionId, kind: RelayKind, raw: &str) {
    let registry = state.lock();
    let peers = registry.peers_of(sender);
    if peers.is_empty() {
        debug!(connection = %sender, %kind, "no peer to relay to, dropping");
        return;
    }

    for peer in peers {
        if let Some(endpoint) = registry.endpoint(peer) {
            debug!(from = %sender, to = %peer, %kind, "relaying");
            endpoint.send_text(raw);
        }
    }
}

/// Remove a departed connection and tell whoever is left
pub fn handle_disconnect(state: &ServerState, id: ConnectionId) {
    let mut registry = state.lock();
    let room = registry.state_of(id).room().cloned();
    let remaining = registry.unregister(id);

    if let Some(room) = room {
        info!(connection = %id, room = %room, remaining = remaining.len(), "left room");
    }
    for peer in remaining {
        if let Some(endpoint) = registry.endpoint(peer) {
            endpoint.send(&ServerEvent::UserLeft);
        }
    }
}

/// Handle a single WebSocket connection from accept to close
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: ServerState,
) -> Result<(), SignalingError> {
    let ws_stream = accept_async(stream).await?;
    let (ws_tx, mut ws_rx) = ws_stream.split();

    let id = ConnectionId::new();
    let (endpoint, rx) = Connection::new(id);
    state.lock().register(endpoint);
    info!(connection = %id, %addr, "client connected");

    let writer = tokio::spawn(connection::write_loop(ws_tx, rx, id));

    while let Some(message) = ws_rx.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                warn!(connection = %id, "WebSocket error: {}", e);
                break;
            }
        };
        match connection::decode(message) {
            Inbound::Request(request) => handle_request(&state, id, request),
            Inbound::Malformed(e) => debug!(connection = %id, "dropping frame: {}", e),
            Inbound::Control => {}
            Inbound::Closed => break,
        }
    }

    handle_disconnect(&state, id);
    info!(connection = %id, %addr, "client disconnected");

    // Unregistering dropped the last sender, so the writer drains and exits
    if let Err(e) = writer.await {
        warn!(connection = %id, "writer task failed: {}", e);
    }
    Ok(())
}
