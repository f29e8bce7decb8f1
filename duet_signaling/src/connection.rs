//! Connection endpoint: framing and safe delivery for one client

use crate::error::ClientRequestError;
use crate::protocol::{ClientRequest, ServerEvent};
use crate::state::ConnectionId;
use futures_util::{Sink, SinkExt};
use std::fmt::Display;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// Frames queued per connection before further frames are dropped
pub const OUTBOUND_CAPACITY: usize = 128;

/// Outbound half of a client's channel.
///
/// Frames are queued on a bounded channel drained by the connection's writer
/// task. Sending never waits, so it may happen under the registry lock; a
/// client that stops reading loses frames instead of growing the queue.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::Sender<String>,
}

impl Connection {
    /// Create an endpoint and the receiver its writer task drains
    pub fn new(id: ConnectionId) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether the writer side is still accepting frames
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queue raw frame text. A closed or full channel makes this a no-op.
    pub fn send_text(&self, text: impl Into<String>) {
        match self.tx.try_send(text.into()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!(connection = %self.id, "outbound queue full, dropping frame");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(connection = %self.id, "dropping frame for closed connection");
            }
        }
    }

    pub fn send(&self, event: &ServerEvent) {
        self.send_text(event.to_string());
    }
}

/// Classification of one inbound WebSocket message
#[derive(Debug)]
pub enum Inbound {
    Request(ClientRequest),
    Malformed(ClientRequestError),
    /// Ping/pong and raw frames, handled by the transport
    Control,
    Closed,
}

/// Decode a WebSocket message into a protocol request
pub fn decode(message: Message) -> Inbound {
    let parsed = match &message {
        Message::Text(text) => text.as_str().parse::<ClientRequest>(),
        Message::Binary(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => text.parse::<ClientRequest>(),
            Err(_) => Err(ClientRequestError::InvalidUtf8),
        },
        Message::Close(_) => return Inbound::Closed,
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => return Inbound::Control,
    };
    match parsed {
        Ok(request) => Inbound::Request(request),
        Err(e) => Inbound::Malformed(e),
    }
}

/// Drain queued frames into the socket until the queue or the socket closes
pub async fn write_loop<S>(mut sink: S, mut rx: mpsc::Receiver<String>, id: ConnectionId)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(text) = rx.recv().await {
        if let Err(e) = sink.send(Message::text(text)).await {
            warn!(connection = %id, "failed to write frame: {}", e);
            break;
        }
    }
    // Stop accepting frames so later sends become no-ops
    rx.close();
    let _ = sink.close().await;
}
