//! Command line and environment configuration

use crate::error::SignalingError;
use clap::Parser;
use std::net::{SocketAddr, ToSocketAddrs};

/// Two-peer WebRTC signaling relay
///
/// Clients join a room by id over WebSocket; the relay pairs at most two of
/// them and forwards offers, answers, candidates and media status between them.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Interface to listen on
    #[arg(long, default_value = "0.0.0.0", env = "DUET_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 5000, env = "PORT")]
    pub port: u16,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info", env = "DUET_LOG")]
    pub log_filter: String,
}

impl ServerConfig {
    /// Resolve the listen address
    pub fn bind_addr(&self) -> Result<SocketAddr, SignalingError> {
        let target = format!("{}:{}", self.host, self.port);
        let resolved = target.to_socket_addrs().ok().and_then(|mut addrs| addrs.next());
        resolved.ok_or(SignalingError::InvalidAddress(target))
    }
}
