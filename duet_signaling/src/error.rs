//! Error types for the signaling relay

use thiserror::Error;

/// Errors from server setup or a single connection's handshake
#[derive(Error, Debug)]
pub enum SignalingError {
    /// WebSocket handshake or transport error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Listen address could not be parsed
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),
}

/// Errors from a single inbound frame. These never leave the connection task.
#[derive(Error, Debug)]
pub enum ClientRequestError {
    /// Frame was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary frame was not valid UTF-8
    #[error("Frame is not valid UTF-8")]
    InvalidUtf8,

    /// Envelope is not an object with a string `type`
    #[error("Envelope has no type tag")]
    MissingType,

    /// `join` without a string `roomID`
    #[error("Join request has no room id")]
    MissingRoomId,

    /// Unsupported message type
    #[error("Unsupported message type: {0}")]
    UnsupportedType(String),
}
