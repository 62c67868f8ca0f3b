//! Error types for the chat server
//!
//! Defines process-level, per-session and queue delivery errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Fatal to the whole process: the listener could not be bound or
/// stopped accepting connections.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-session errors
///
/// Handled at the session boundary; never propagated to the room.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Writing to the connection failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading from the connection failed for a reason other than closure
    #[error("read error: {0}")]
    Read(#[source] std::io::Error),

    /// The request stream ended before an interactive shell was requested
    #[error("shell was never requested")]
    ShellNotRequested,
}

/// Message delivery errors
///
/// Occurs when a non-blocking enqueue onto a client's outbound queue fails.
/// The room drops the message for that client only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The outbound queue is at capacity
    #[error("Outbound queue full")]
    QueueFull,

    /// The receiving end of the queue has been dropped
    #[error("Outbound queue closed")]
    QueueClosed,
}
