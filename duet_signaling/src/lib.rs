//! Two-peer WebRTC signaling relay over WebSocket
//!
//! Browsers rendezvous by a shared room id and exchange the handshake
//! messages needed to set up a direct media session. The relay never looks
//! inside those messages; it only tracks who is in which room and forwards
//! frames to the other member.
//!
//! # Protocol
//!
//! All frames are JSON objects tagged by `type`.
//!
//! ## Client → server
//!
//! - `{"type":"join","roomID":"<id>"}` - join (or create) a room
//! - `{"type":"offer"|"answer", ...}` - relayed verbatim
//! - `{"type":"candidate","candidate":...}` - relayed verbatim
//! - `{"type":"mic-status"|"camera-status","enabled":<bool>}` - relayed verbatim
//!
//! ## Server → client
//!
//! - `{"type":"joined","users":<1|2>}` - join accepted; `2` means "send the offer"
//! - `{"type":"room-full"}` - room already has two members
//! - `{"type":"user-joined"}` - the other member arrived
//! - `{"type":"user-left"}` - the other member disconnected
//!
//! Malformed frames and unknown types are dropped without a reply.
//!
//! # Example
//!
//! ```bash
//! # Start the relay on port 5000
//! duet-signaling --port 5000
//!
//! # Join a room from a shell
//! websocat ws://127.0.0.1:5000
//! {"type":"join","roomID":"r1"}
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::SignalingError;
pub use handler::handle_connection;
pub use server::{serve, serve_incoming};
pub use state::{ConnectionId, ConnectionState, RoomId, ServerState};
