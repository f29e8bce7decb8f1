//! Accept loop

use crate::handler::handle_connection;
use crate::state::ServerState;
use futures_util::{Stream, StreamExt, stream};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, warn};

/// Pause after a failed accept, so descriptor exhaustion does not spin
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Accept WebSocket clients forever, one task per connection.
pub async fn serve(listener: TcpListener, state: ServerState) {
    let incoming = stream::unfold(listener, |listener| async move {
        let accepted = listener.accept().await;
        Some((accepted, listener))
    });
    serve_incoming(incoming, state).await;
}

/// Run the accept loop over any source of TCP connections.
///
/// Accept errors are logged and skipped; a failed handshake or transport
/// error only ends that client's task. Returns when `incoming` ends.
pub async fn serve_incoming<S>(incoming: S, state: ServerState)
where
    S: Stream<Item = io::Result<(TcpStream, SocketAddr)>>,
{
    let mut incoming = std::pin::pin!(incoming);
    while let Some(accepted) = incoming.next().await {
        let (stream, addr) = match accepted {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("failed to accept connection: {}", e);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        debug!(%addr, "accepted TCP connection");

        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, state).await {
                warn!(%addr, "connection ended with error: {}", e);
            }
        });
    }
}
