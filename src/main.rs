//! Terminal Chat Server - Entry Point
//!
//! Starts the TCP listener and the shared room, accepting connections
//! until Ctrl+C or SIGTERM.

use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use term_chat::{handle_connection, shutdown_signal, AppError, Room, SessionError};

/// Default server address
const DEFAULT_ADDR: &str = "127.0.0.1:2222";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=term_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("term_chat=info")),
        )
        .init();

    // Get bind address from command line or use default
    let addr = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let listener = TcpListener::bind(&addr).await?;
    info!("Chat server listening on {}", addr);

    let room = Arc::new(Room::new());

    let shutdown = shutdown_signal()?;
    tokio::pin!(shutdown);

    // Connection accept loop
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let room = Arc::clone(&room);

                    // Spawn session task for each connection
                    tokio::spawn(async move {
                        match handle_connection(stream, room).await {
                            Ok(()) => {}
                            Err(SessionError::ShellNotRequested) => {
                                debug!("{} never started a shell", addr);
                            }
                            Err(e) => error!("Session error for {}: {}", addr, e),
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            },
            _ = &mut shutdown => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}
