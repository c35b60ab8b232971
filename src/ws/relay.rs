use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::SendMessage;
use crate::ws::registry::{ConnectionId, ConnectionRegistry};

/// Fans realtime messages out to the outbound channels of registered connections.
///
/// Each connection owns one unbounded channel, so messages reach a given client
/// in the order they were enqueued for it. Nothing is ordered across clients.
#[derive(Clone, Default)]
pub struct BroadcastRelay {
    registry: Arc<Mutex<ConnectionRegistry>>,
}

impl BroadcastRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the registry. The guard must not be held across an await.
    pub fn registry(&self) -> MutexGuard<'_, ConnectionRegistry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new connection and hand back the receiving end of its channel
    pub fn connect(&self) -> (ConnectionId, UnboundedReceiver<SendMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.registry();
        let mut id = Uuid::new_v4().to_string();
        while !registry.register(&id, tx.clone()) {
            id = Uuid::new_v4().to_string();
        }
        info!("Connection {} registered", id);
        (id, rx)
    }

    pub fn disconnect(&self, connection_id: &str) {
        if let Some(conn) = self.registry().unregister(connection_id) {
            info!(
                "Connection {} unregistered, left {} room(s)",
                connection_id,
                conn.joined_rooms.len()
            );
        }
    }

    pub fn join_room(&self, connection_id: &str, room_id: &str) -> bool {
        self.registry().join_room(connection_id, room_id)
    }

    pub fn leave_room(&self, connection_id: &str, room_id: &str) -> bool {
        self.registry().leave_room(connection_id, room_id)
    }

    /// Deliver to every member of `room_id` except the sender, stamped with the
    /// sender's id. Returns how many connections the message was queued for.
    pub fn relay_to_room(&self, room_id: &str, msg: SendMessage, sender_id: &str) -> usize {
        let msg = msg.stamped(sender_id);
        let registry = self.registry();
        let mut delivered = 0;
        for member in registry.members_of(room_id) {
            if member == sender_id {
                continue;
            }
            if let Some(conn) = registry.get(&member) {
                if conn.outbound.send(msg.clone()).is_ok() {
                    delivered += 1;
                } else {
                    debug!("Dropped message for closed connection {}", member);
                }
            }
        }
        debug!("Relayed to {} member(s) of room {}", delivered, room_id);
        delivered
    }

    /// Deliver to every registered connection, the originator included
    pub fn broadcast_all(&self, msg: SendMessage) -> usize {
        let registry = self.registry();
        let mut delivered = 0;
        for conn in registry.connections() {
            if conn.outbound.send(msg.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!("Dropped broadcast for closed connection {}", conn.id);
            }
        }
        delivered
    }

    /// Queue a message for a single connection
    pub fn send_to(&self, connection_id: &str, msg: SendMessage) -> bool {
        self.registry()
            .get(connection_id)
            .map(|conn| conn.outbound.send(msg).is_ok())
            .unwrap_or(false)
    }
}
