use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc::UnboundedSender;

use crate::models::SendMessage;

pub type ConnectionId = String;
pub type RoomId = String;

/// A live client session and the rooms it has joined
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub joined_rooms: HashSet<RoomId>,
    pub outbound: UnboundedSender<SendMessage>,
}

/// In-memory bookkeeping of connections and room membership.
///
/// Rooms are implicit: a room exists exactly while some connection has joined
/// it, so the room index never keeps an empty member set around.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id is already registered, in which case nothing changes.
    pub fn register(&mut self, id: &str, outbound: UnboundedSender<SendMessage>) -> bool {
        if self.connections.contains_key(id) {
            return false;
        }
        self.connections.insert(
            id.to_string(),
            Connection {
                id: id.to_string(),
                joined_rooms: HashSet::new(),
                outbound,
            },
        );
        true
    }

    /// Returns true if the connection was not yet a member.
    pub fn join_room(&mut self, id: &str, room_id: &str) -> bool {
        let Some(conn) = self.connections.get_mut(id) else {
            return false;
        };
        if !conn.joined_rooms.insert(room_id.to_string()) {
            return false;
        }
        self.rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(id.to_string());
        true
    }

    /// Returns true if the connection was a member.
    pub fn leave_room(&mut self, id: &str, room_id: &str) -> bool {
        let Some(conn) = self.connections.get_mut(id) else {
            return false;
        };
        if !conn.joined_rooms.remove(room_id) {
            return false;
        }
        self.remove_member(room_id, id);
        true
    }

    /// Drop the connection and its membership in every room.
    pub fn unregister(&mut self, id: &str) -> Option<Connection> {
        let conn = self.connections.remove(id)?;
        for room_id in &conn.joined_rooms {
            self.remove_member(room_id, id);
        }
        Some(conn)
    }

    fn remove_member(&mut self, room_id: &str, id: &str) {
        if let Some(members) = self.rooms.get_mut(room_id) {
            members.remove(id);
            if members.is_empty() {
                self.rooms.remove(room_id);
            }
        }
    }

    pub fn members_of(&self, room_id: &str) -> HashSet<ConnectionId> {
        self.rooms.get(room_id).cloned().unwrap_or_default()
    }

    pub fn rooms_of(&self, id: &str) -> HashSet<RoomId> {
        self.connections
            .get(id)
            .map(|conn| conn.joined_rooms.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn connection_ids(&self) -> HashSet<ConnectionId> {
        self.connections.keys().cloned().collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
