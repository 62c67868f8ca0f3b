//! Terminal Chat Server Library
//!
//! A multi-user chat room served over interactive remote-shell connections.
//! Every accepted connection becomes a participant; each line typed is
//! broadcast to everyone else in real time.
//!
//! # Features
//! - Shared room with join/leave notices
//! - Per-participant display colors
//! - Line editing with backspace, Ctrl+C and Ctrl+D
//! - Pinned "users online" status line above the input prompt
//! - Bounded per-client queues that drop messages for slow readers
//!
//! # Architecture
//! - `Room` is shared by all sessions behind an `Arc`; its client map is
//!   guarded by a reader/writer lock and fan-out never blocks
//! - Each connection runs `handle_session`, which owns a line buffer and a
//!   terminal renderer, plus a relay task draining the client's queue
//! - Shutdown is driven by closing resources: removing a client closes its
//!   queue, which ends its relay
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use term_chat::{handle_connection, Room};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:2222").await.unwrap();
//!     let room = Arc::new(Room::new());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         tokio::spawn(handle_connection(stream, Arc::clone(&room)));
//!     }
//! }
//! ```

pub mod client;
pub mod clock;
pub mod color;
pub mod error;
pub mod handler;
pub mod input;
pub mod line_buffer;
pub mod message;
pub mod room;
pub mod session;
pub mod shutdown;
pub mod terminal;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use clock::{Clock, FixedClock, SystemClock};
pub use color::{ColorPicker, FixedColorPicker, RandomColorPicker};
pub use error::{AppError, DeliveryError, SessionError};
pub use handler::handle_connection;
pub use line_buffer::LineBuffer;
pub use room::Room;
pub use session::handle_session;
pub use shutdown::shutdown_signal;
pub use terminal::TerminalUi;
pub use transport::{ChannelRequest, RequestKind};
pub use types::{ClientId, Color};
