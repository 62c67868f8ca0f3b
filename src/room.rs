//! Room struct definition
//!
//! The shared registry of connected participants and the broadcast fan-out
//! engine. One room lives for the whole process and is shared by every
//! session through an `Arc`.
//!
//! Locking: the client map sits behind a single `RwLock`. Registration and
//! removal take the write lock; broadcasts take the read lock, so fan-outs
//! may run concurrently with each other but never with a mutation. Ids come
//! from an atomic counter and are never reused.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::client::{Client, Member};
use crate::clock::{Clock, SystemClock};
use crate::color::{ColorPicker, RandomColorPicker};
use crate::message::{format_system_message, format_user_message, join_notice, leave_notice};
use crate::types::ClientId;

/// Chat room shared by all sessions
pub struct Room {
    /// Registered clients: ClientId -> Member
    clients: RwLock<HashMap<ClientId, Member>>,
    /// Last assigned id sequence
    sequence: AtomicU64,
    clock: Box<dyn Clock>,
    colors: Box<dyn ColorPicker>,
}

impl Room {
    /// Create an empty room using the system clock and random colors
    pub fn new() -> Self {
        Self::with_parts(SystemClock, RandomColorPicker::default())
    }

    /// Create an empty room with an injected clock and color picker
    pub fn with_parts(
        clock: impl Clock + 'static,
        colors: impl ColorPicker + 'static,
    ) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            clock: Box::new(clock),
            colors: Box::new(colors),
        }
    }

    /// Number of registered clients
    pub fn client_count(&self) -> usize {
        self.read_clients().len()
    }

    /// Register a new participant
    ///
    /// An empty `username` falls back to the assigned id. Every registered
    /// client, including the new one, receives a "joined" notice.
    pub fn add_client(&self, username: &str) -> Client {
        let id = ClientId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        let username = if username.is_empty() {
            id.to_string()
        } else {
            username.to_string()
        };

        let (member, client) = Member::register(id, username, self.colors.next_color());

        let total = {
            let mut clients = self.write_clients();
            clients.insert(id, member);
            clients.len()
        };

        info!("Client {} joined as '{}' ({} online)", id, client.username, total);
        self.broadcast_system(&join_notice(&client.username));
        client
    }

    /// Unregister a participant
    ///
    /// Closes its outbound queue and notifies the remaining clients. Unknown
    /// or already-removed ids are ignored.
    pub fn remove_client(&self, id: ClientId) {
        let removed = self.write_clients().remove(&id);

        let Some(member) = removed else {
            debug!("Client {} already removed", id);
            return;
        };

        let username = member.username.clone();
        // Dropping the sender closes the client's queue
        drop(member);

        info!("Client {} ('{}') left ({} online)", id, username, self.client_count());
        self.broadcast_system(&leave_notice(&username));
    }

    /// Deliver a user message to every client except the sender
    ///
    /// The sender is labelled with its colored username while registered,
    /// otherwise with `sender_name` as given. Returns the formatted line so
    /// the sender's own session can render it locally.
    pub fn broadcast(&self, sender_id: ClientId, sender_name: &str, text: &str) -> String {
        let ts = self.clock.timestamp();

        let clients = self.read_clients();
        let label = clients
            .get(&sender_id)
            .map(Member::label)
            .unwrap_or_else(|| sender_name.to_string());

        let msg = format_user_message(&ts, &label, text);
        deliver(&clients, Some(sender_id), &msg);
        msg
    }

    fn broadcast_system(&self, text: &str) {
        let msg = format_system_message(&self.clock.timestamp(), text);
        deliver(&self.read_clients(), None, &msg);
    }

    fn read_clients(&self) -> RwLockReadGuard<'_, HashMap<ClientId, Member>> {
        self.clients.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_clients(&self) -> RwLockWriteGuard<'_, HashMap<ClientId, Member>> {
        self.clients.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}

/// Fan a message out to every client but `exclude` without blocking
fn deliver(clients: &HashMap<ClientId, Member>, exclude: Option<ClientId>, msg: &str) {
    for (id, member) in clients {
        if Some(*id) == exclude {
            continue;
        }
        if let Err(e) = member.try_deliver(msg.to_string()) {
            debug!("Dropped message for {}: {}", id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::NaiveDate;
    use tokio::sync::mpsc::error::TryRecvError;

    use super::*;
    use crate::client::OUTBOUND_CAPACITY;
    use crate::clock::FixedClock;
    use crate::color::FixedColorPicker;

    fn test_room() -> Room {
        let time = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .unwrap();
        Room::with_parts(FixedClock::new(time), FixedColorPicker::plain())
    }

    fn drain(client: &mut Client) -> Vec<String> {
        let mut drained = Vec::new();
        while let Ok(msg) = client.outbound.try_recv() {
            drained.push(msg);
        }
        drained
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let room = test_room();
        let ids: Vec<ClientId> = (0..5).map(|_| room.add_client("x").id).collect();

        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(ids[0].to_string(), "user-001");
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let room = test_room();
        let first = room.add_client("a");
        room.remove_client(first.id);

        let second = room.add_client("b");
        assert_ne!(first.id, second.id);
        assert_eq!(room.client_count(), 1);
    }

    #[test]
    fn test_concurrent_adds_get_distinct_ids() {
        let room = Arc::new(test_room());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let room = Arc::clone(&room);
                thread::spawn(move || (0..10).map(|_| room.add_client("").id).collect::<Vec<_>>())
            })
            .collect();

        let mut ids: Vec<ClientId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 80);
        assert_eq!(room.client_count(), 80);
    }

    #[test]
    fn test_empty_username_falls_back_to_id() {
        let room = test_room();
        let client = room.add_client("");
        assert_eq!(client.username, client.id.to_string());
    }

    #[test]
    fn test_new_client_receives_own_join_notice() {
        let room = test_room();
        let mut alice = room.add_client("alice");

        let msgs = drain(&mut alice);
        assert_eq!(msgs, vec!["[2024-01-02 03:04:05] [system] alice joined the chat"]);
    }

    #[test]
    fn test_broadcast_delivers_to_other_clients() {
        let room = test_room();
        let mut alice = room.add_client("alice");
        let mut bob = room.add_client("bob");
        drain(&mut alice);
        drain(&mut bob);

        let msg = room.broadcast(alice.id, &alice.username, "hello world");
        assert!(msg.contains("hello world"));
        assert!(msg.contains("alice"));

        assert_eq!(bob.outbound.try_recv().unwrap(), msg);
        assert_eq!(alice.outbound.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_broadcast_colors_registered_sender() {
        let room = Room::with_parts(
            FixedClock::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap()),
            FixedColorPicker::new(&["\x1b[32m"]),
        );
        let alice = room.add_client("alice");

        let msg = room.broadcast(alice.id, &alice.username, "hi");
        assert_eq!(msg, "[2024-01-02 00:00:00] \x1b[32malice\x1b[0m: hi");
    }

    #[test]
    fn test_broadcast_from_removed_sender_uses_fallback_name() {
        let room = test_room();
        let alice = room.add_client("alice");
        let mut bob = room.add_client("bob");
        room.remove_client(alice.id);
        drain(&mut bob);

        let msg = room.broadcast(alice.id, "alice (gone)", "late message");
        assert_eq!(msg, "[2024-01-02 03:04:05] alice (gone): late message");
        assert_eq!(bob.outbound.try_recv().unwrap(), msg);
    }

    #[test]
    fn test_full_queue_drops_for_that_client_only() {
        let room = test_room();
        let alice = room.add_client("alice");
        let mut bob = room.add_client("bob");
        let mut carol = room.add_client("carol");
        drain(&mut bob);
        drain(&mut carol);

        let total = OUTBOUND_CAPACITY + 4;
        let mut carol_received = 0;
        for i in 0..total {
            room.broadcast(alice.id, &alice.username, &format!("msg {}", i));
            carol_received += drain(&mut carol).len();
        }

        assert_eq!(drain(&mut bob).len(), OUTBOUND_CAPACITY);
        assert_eq!(carol_received, total);
    }

    #[test]
    fn test_remove_client_closes_queue() {
        let room = test_room();
        let mut carol = room.add_client("carol");
        drain(&mut carol);

        room.remove_client(carol.id);

        assert_eq!(carol.outbound.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn test_remove_notifies_remaining_clients() {
        let room = test_room();
        let mut alice = room.add_client("alice");
        let mut bob = room.add_client("bob");
        let mut carol = room.add_client("carol");
        drain(&mut alice);
        drain(&mut bob);
        drain(&mut carol);

        room.remove_client(carol.id);

        for client in [&mut alice, &mut bob] {
            let msgs = drain(client);
            assert_eq!(msgs.len(), 1);
            assert!(msgs[0].contains("left"));
            assert!(msgs[0].contains("carol"));
        }
        assert_eq!(carol.outbound.try_recv(), Err(TryRecvError::Disconnected));
        assert_eq!(room.client_count(), 2);
    }

    #[test]
    fn test_remove_unknown_or_twice_is_noop() {
        let room = test_room();
        let mut alice = room.add_client("alice");
        let bob = room.add_client("bob");
        room.remove_client(bob.id);
        drain(&mut alice);

        room.remove_client(bob.id);
        room.remove_client(ClientId(999));

        assert!(drain(&mut alice).is_empty());
        assert_eq!(room.client_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_broadcast_and_removal() {
        let room = Arc::new(test_room());
        let alice = room.add_client("alice");
        let mut watchers: Vec<Client> = (0..4).map(|_| room.add_client("")).collect();

        let sender = {
            let room = Arc::clone(&room);
            let (id, name) = (alice.id, alice.username.clone());
            tokio::spawn(async move {
                for i in 0..50 {
                    room.broadcast(id, &name, &format!("tick {}", i));
                    tokio::task::yield_now().await;
                }
            })
        };
        for watcher in &watchers {
            room.remove_client(watcher.id);
        }
        sender.await.unwrap();

        // Every removed queue ends closed, whatever it managed to receive
        for watcher in &mut watchers {
            while watcher.recv().await.is_some() {}
        }
        assert_eq!(room.client_count(), 1);
    }
}
