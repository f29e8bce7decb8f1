//! Room registry for the signaling relay
//!
//! The registry is the only record of who is in which room. It is owned by a
//! [`ServerState`] handle and guarded by one mutex, so every join, leave and
//! peer lookup sees a consistent snapshot.

use crate::connection::Connection;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Maximum number of connections in one room
pub const ROOM_CAPACITY: usize = 2;

/// Room identifier, as supplied by the client
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(pub String);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one client session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Protocol state of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No room yet; only `join` is meaningful
    Unjoined,
    /// Alone in a room
    Waiting(RoomId),
    /// Sharing a room with one peer
    Paired(RoomId),
    /// Transport gone; no longer registered
    Closed,
}

impl ConnectionState {
    pub fn room(&self) -> Option<&RoomId> {
        match self {
            Self::Waiting(room) | Self::Paired(room) => Some(room),
            Self::Unjoined | Self::Closed => None,
        }
    }

    fn for_room(room: RoomId, members: usize) -> Self {
        if members >= ROOM_CAPACITY {
            Self::Paired(room)
        } else {
            Self::Waiting(room)
        }
    }
}

/// Result of [`Registry::join`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Enrolled; member count after the join
    Joined(usize),
    /// Room already at capacity; nothing changed
    RoomFull,
}

#[derive(Debug)]
struct ConnectionRecord {
    endpoint: Connection,
    state: ConnectionState,
}

/// Membership of every room and the state of every live connection
#[derive(Debug, Default)]
pub struct Registry {
    connections: HashMap<ConnectionId, ConnectionRecord>,
    /// Members in join order; never empty, never longer than ROOM_CAPACITY
    rooms: HashMap<RoomId, Vec<ConnectionId>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly accepted connection as Unjoined
    pub fn register(&mut self, endpoint: Connection) {
        self.connections.insert(
            endpoint.id(),
            ConnectionRecord {
                endpoint,
                state: ConnectionState::Unjoined,
            },
        );
    }

    /// Leave any room and forget the connection. Returns the peers left behind.
    pub fn unregister(&mut self, id: ConnectionId) -> Vec<ConnectionId> {
        let remaining = self.leave(id);
        self.connections.remove(&id);
        remaining
    }

    pub fn state_of(&self, id: ConnectionId) -> ConnectionState {
        self.connections
            .get(&id)
            .map(|record| record.state.clone())
            .unwrap_or(ConnectionState::Closed)
    }

    pub fn endpoint(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id).map(|record| &record.endpoint)
    }

    /// Enroll a connection in a room, creating the room if needed.
    ///
    /// A full room is left untouched and the caller's state is unchanged.
    pub fn join(&mut self, room: &RoomId, id: ConnectionId) -> JoinOutcome {
        let members = self.rooms.entry(room.clone()).or_default();
        if members.len() >= ROOM_CAPACITY {
            return JoinOutcome::RoomFull;
        }
        members.push(id);
        let count = members.len();
        let members = members.clone();

        for member in members {
            if let Some(record) = self.connections.get_mut(&member) {
                record.state = ConnectionState::for_room(room.clone(), count);
            }
        }
        JoinOutcome::Joined(count)
    }

    /// Remove a connection from its room, deleting the room when it empties.
    ///
    /// Returns the remaining peers; a connection in no room yields none.
    pub fn leave(&mut self, id: ConnectionId) -> Vec<ConnectionId> {
        let Some(record) = self.connections.get_mut(&id) else {
            return Vec::new();
        };
        let Some(room) = record.state.room().cloned() else {
            return Vec::new();
        };
        record.state = ConnectionState::Unjoined;

        let Some(members) = self.rooms.get_mut(&room) else {
            return Vec::new();
        };
        members.retain(|member| *member != id);
        let remaining = members.clone();
        if remaining.is_empty() {
            self.rooms.remove(&room);
        }

        for peer in &remaining {
            if let Some(record) = self.connections.get_mut(peer) {
                record.state = ConnectionState::for_room(room.clone(), remaining.len());
            }
        }
        remaining
    }

    /// Other members of the caller's room, excluding the caller
    pub fn peers_of(&self, id: ConnectionId) -> Vec<ConnectionId> {
        self.connections
            .get(&id)
            .and_then(|record| record.state.room())
            .map(|room| {
                self.room_members(room)
                    .into_iter()
                    .filter(|member| *member != id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All members of a room in join order
    pub fn room_members(&self, room: &RoomId) -> Vec<ConnectionId> {
        self.rooms.get(room).cloned().unwrap_or_default()
    }

    pub fn room_size(&self, room: &RoomId) -> usize {
        self.rooms.get(room).map_or(0, Vec::len)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

/// Shared handle to the registry, cloned into every connection task
#[derive(Default, Clone)]
pub struct ServerState {
    registry: Arc<Mutex<Registry>>,
}

impl ServerState {
    /// Create a new server state handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the registry. The guard must not be held across an await.
    pub fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock()
    }

    pub fn state_of(&self, id: ConnectionId) -> ConnectionState {
        self.lock().state_of(id)
    }

    pub fn room_members(&self, room: &RoomId) -> Vec<ConnectionId> {
        self.lock().room_members(room)
    }

    pub fn room_count(&self) -> usize {
        self.lock().room_count()
    }

    pub fn connection_count(&self) -> usize {
        self.lock().connection_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(name: &str) -> RoomId {
        RoomId(name.to_string())
    }

    fn connect(registry: &mut Registry) -> ConnectionId {
        let (endpoint, _rx) = Connection::new(ConnectionId::new());
        let id = endpoint.id();
        registry.register(endpoint);
        id
    }

    #[test]
    fn join_creates_room_and_counts_members() {
        let mut registry = Registry::new();
        let (x, y) = (connect(&mut registry), connect(&mut registry));
        let r1 = room("r1");

        assert_eq!(registry.join(&r1, x), JoinOutcome::Joined(1));
        assert_eq!(registry.state_of(x), ConnectionState::Waiting(r1.clone()));

        assert_eq!(registry.join(&r1, y), JoinOutcome::Joined(2));
        assert_eq!(registry.state_of(x), ConnectionState::Paired(r1.clone()));
        assert_eq!(registry.state_of(y), ConnectionState::Paired(r1.clone()));
        assert_eq!(registry.room_members(&r1), vec![x, y]);
    }

    #[test]
    fn full_room_is_not_mutated() {
        let mut registry = Registry::new();
        let (x, y, z) = (
            connect(&mut registry),
            connect(&mut registry),
            connect(&mut registry),
        );
        let r1 = room("r1");
        registry.join(&r1, x);
        registry.join(&r1, y);

        assert_eq!(registry.join(&r1, z), JoinOutcome::RoomFull);
        assert_eq!(registry.room_members(&r1), vec![x, y]);
        assert_eq!(registry.state_of(z), ConnectionState::Unjoined);
    }

    #[test]
    fn peers_exclude_caller() {
        let mut registry = Registry::new();
        let (x, y, lone) = (
            connect(&mut registry),
            connect(&mut registry),
            connect(&mut registry),
        );
        registry.join(&room("r1"), x);
        registry.join(&room("r1"), y);

        assert_eq!(registry.peers_of(x), vec![y]);
        assert_eq!(registry.peers_of(y), vec![x]);
        assert!(registry.peers_of(lone).is_empty());
    }

    #[test]
    fn leave_reports_survivors_and_drops_empty_rooms() {
        let mut registry = Registry::new();
        let (x, y) = (connect(&mut registry), connect(&mut registry));
        let r1 = room("r1");
        registry.join(&r1, x);
        registry.join(&r1, y);

        assert_eq!(registry.leave(y), vec![x]);
        assert_eq!(registry.room_size(&r1), 1);
        assert_eq!(registry.state_of(x), ConnectionState::Waiting(r1.clone()));

        assert!(registry.leave(x).is_empty());
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn leave_without_room_is_noop() {
        let mut registry = Registry::new();
        let (x, y, idle) = (
            connect(&mut registry),
            connect(&mut registry),
            connect(&mut registry),
        );
        registry.join(&room("r1"), x);
        registry.join(&room("r1"), y);

        assert!(registry.leave(idle).is_empty());
        assert!(registry.leave(ConnectionId::new()).is_empty());
        assert_eq!(registry.room_members(&room("r1")), vec![x, y]);
        assert_eq!(registry.state_of(idle), ConnectionState::Unjoined);
    }

    #[test]
    fn unregister_closes_connection() {
        let mut registry = Registry::new();
        let x = connect(&mut registry);
        registry.join(&room("r1"), x);

        assert!(registry.unregister(x).is_empty());
        assert_eq!(registry.state_of(x), ConnectionState::Closed);
        assert_eq!(registry.connection_count(), 0);
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn rooms_are_independent() {
        let mut registry = Registry::new();
        let (a, b, c) = (
            connect(&mut registry),
            connect(&mut registry),
            connect(&mut registry),
        );
        registry.join(&room("r1"), a);
        registry.join(&room("r2"), b);
        registry.join(&room("r2"), c);

        assert_eq!(registry.room_count(), 2);
        assert!(registry.peers_of(a).is_empty());
        assert_eq!(registry.unregister(b), vec![c]);
        assert_eq!(registry.room_size(&room("r1")), 1);
    }
}
