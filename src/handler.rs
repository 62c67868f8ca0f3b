//! Plain TCP connection handler
//!
//! Serves the chat over a bare TCP socket. There is no handshake and no
//! out-of-band channel, so each connection is treated as a client that
//! immediately asked for an interactive shell, with no claimed name.
//! Clients are expected to put their terminal in raw mode, e.g.
//! `stty raw -echo; nc 127.0.0.1 2222; stty sane`.

use std::sync::Arc;

use futures_util::stream;
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::room::Room;
use crate::session::handle_session;
use crate::transport::ChannelRequest;

/// Handle a new TCP connection
///
/// Runs a full chat session and returns once it has been cleaned up.
pub async fn handle_connection(stream: TcpStream, room: Arc<Room>) -> Result<(), SessionError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // Keystrokes are tiny writes; don't let Nagle hold back the echo
    stream.set_nodelay(true)?;

    let (shell, _reply) = ChannelRequest::new("shell");
    let result = handle_session(room, String::new(), stream, stream::iter(vec![shell])).await;

    info!("Connection from {} closed", peer_addr);
    result
}
