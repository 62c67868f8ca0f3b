//! Client struct definition
//!
//! A registered participant is split in two halves:
//! - [`Client`]: the handle returned to the session, owning the receiving end
//!   of the outbound queue.
//! - [`Member`]: the room's entry, owning the sending end. Dropping the member
//!   closes the queue.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::DeliveryError;
use crate::message::colorize;
use crate::types::{ClientId, Color};

/// Capacity of each client's outbound message queue
pub const OUTBOUND_CAPACITY: usize = 16;

/// Connected participant handle
///
/// Returned by [`Room::add_client`](crate::Room::add_client). The session
/// that owns it drains `outbound` until the room closes the queue.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Display name (falls back to the id when none was claimed)
    pub username: String,
    /// Display color token
    pub color: Color,
    /// Room → Client message queue
    pub outbound: mpsc::Receiver<String>,
}

impl Client {
    /// Wait for the next delivered message
    ///
    /// Returns `None` once the room has removed this client and every
    /// queued message has been received.
    pub async fn recv(&mut self) -> Option<String> {
        self.outbound.recv().await
    }
}

/// Room-side registration entry
#[derive(Debug)]
pub(crate) struct Member {
    pub(crate) username: String,
    pub(crate) color: Color,
    sender: mpsc::Sender<String>,
}

impl Member {
    /// Create an entry and the matching client handle
    pub(crate) fn register(id: ClientId, username: String, color: Color) -> (Self, Client) {
        let (sender, outbound) = mpsc::channel(OUTBOUND_CAPACITY);
        let member = Self {
            username: username.clone(),
            color: color.clone(),
            sender,
        };
        let client = Client {
            id,
            username,
            color,
            outbound,
        };
        (member, client)
    }

    /// Enqueue a message without waiting
    pub(crate) fn try_deliver(&self, msg: String) -> Result<(), DeliveryError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::QueueClosed,
        })
    }

    pub(crate) fn label(&self) -> String {
        colorize(&self.color, &self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_links_queue() {
        let (member, mut client) = Member::register(ClientId(1), "alice".into(), Color::none());

        member.try_deliver("hello".to_string()).unwrap();
        assert_eq!(client.recv().await.as_deref(), Some("hello"));
        assert_eq!(client.id, ClientId(1));
        assert_eq!(client.username, "alice");
    }

    #[tokio::test]
    async fn test_try_deliver_full_queue() {
        let (member, _client) = Member::register(ClientId(1), "alice".into(), Color::none());

        for i in 0..OUTBOUND_CAPACITY {
            assert!(member.try_deliver(format!("msg {}", i)).is_ok());
        }
        assert_eq!(
            member.try_deliver("overflow".to_string()),
            Err(DeliveryError::QueueFull)
        );
    }

    #[tokio::test]
    async fn test_dropping_member_closes_queue() {
        let (member, mut client) = Member::register(ClientId(1), "alice".into(), Color::none());
        member.try_deliver("last".to_string()).unwrap();
        drop(member);

        assert_eq!(client.recv().await.as_deref(), Some("last"));
        assert_eq!(client.recv().await, None);
    }

    #[tokio::test]
    async fn test_try_deliver_after_client_dropped() {
        let (member, client) = Member::register(ClientId(1), "alice".into(), Color::none());
        drop(client);
        assert_eq!(
            member.try_deliver("lost".to_string()),
            Err(DeliveryError::QueueClosed)
        );
    }

    #[test]
    fn test_label_uses_color() {
        let (member, client) =
            Member::register(ClientId(1), "alice".into(), Color::from("\x1b[35m"));
        assert_eq!(member.label(), "\x1b[35malice\x1b[0m");
        assert_eq!(client.color.as_str(), "\x1b[35m");
    }
}
