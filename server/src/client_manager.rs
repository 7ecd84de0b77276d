//! Connection and session management for the arena server
//!
//! This module handles the server-side bookkeeping of connected clients:
//! - Client connection lifecycle (connect, join, death, disconnect)
//! - The session record mapping a connection to its `{room_id, player_id}`
//! - Fire-and-forget delivery of encoded frames to connection writer tasks
//! - Client capacity management
//!
//! Transport identity (the connection id) is kept separate from simulation
//! identity (the player id inside a room); the session record is the only
//! link between the two.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// An encoded packet shared between every recipient of a broadcast
pub type Frame = Arc<Vec<u8>>;

/// Which room and player a connection currently controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub room_id: String,
    pub player_id: u32,
}

/// Represents a connected client
#[derive(Debug)]
pub struct Client {
    /// Unique connection identifier assigned by the server
    pub id: u32,
    /// Remote address, kept for logging
    pub addr: SocketAddr,
    /// Outbound queue drained by the connection's writer task
    pub sender: mpsc::Sender<Frame>,
    /// Present while the client controls a living player
    pub session: Option<Session>,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr, sender: mpsc::Sender<Frame>) -> Self {
        Self {
            id,
            addr,
            sender,
            session: None,
        }
    }

    /// Queues a frame without waiting.
    ///
    /// A full queue means the client is not keeping up; the frame is dropped
    /// and the next snapshot supersedes it.
    pub fn send(&self, frame: Frame) -> bool {
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue full for client {}, dropping frame", self.id);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Writer for client {} already closed", self.id);
                false
            }
        }
    }

    pub fn is_in_room(&self, room_id: &str) -> bool {
        self.session
            .as_ref()
            .map_or(false, |session| session.room_id == room_id)
    }
}

/// Manages all connected clients and their sessions
pub struct ClientManager {
    /// Connected clients indexed by their unique ID
    clients: HashMap<u32, Client>,
    /// Next available client ID for new connections
    next_client_id: u32,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Attempts to add a new client connection
    ///
    /// Returns Some(client_id) if successful, None if server is at capacity.
    pub fn add_client(&mut self, addr: SocketAddr, sender: mpsc::Sender<Frame>) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients
            .insert(client_id, Client::new(client_id, addr, sender));

        Some(client_id)
    }

    /// Removes a client, handing back its record so the caller can release
    /// the player it controlled.
    pub fn remove_client(&mut self, client_id: &u32) -> Option<Client> {
        let client = self.clients.remove(client_id)?;
        info!("Client {} disconnected", client.id);
        Some(client)
    }

    pub fn get(&self, client_id: u32) -> Option<&Client> {
        self.clients.get(&client_id)
    }

    pub fn session(&self, client_id: u32) -> Option<&Session> {
        self.clients
            .get(&client_id)
            .and_then(|client| client.session.as_ref())
    }

    /// Binds a connection to a player; returns false for unknown clients
    pub fn set_session(&mut self, client_id: u32, session: Session) -> bool {
        match self.clients.get_mut(&client_id) {
            Some(client) => {
                client.session = Some(session);
                true
            }
            None => false,
        }
    }

    pub fn clear_session(&mut self, client_id: u32) -> Option<Session> {
        self.clients
            .get_mut(&client_id)
            .and_then(|client| client.session.take())
    }

    /// Finds the connection controlling `player_id` in `room_id`
    pub fn find_client_by_player(&self, room_id: &str, player_id: u32) -> Option<u32> {
        self.clients
            .values()
            .find(|client| {
                client.session.as_ref().map_or(false, |session| {
                    session.room_id == room_id && session.player_id == player_id
                })
            })
            .map(|client| client.id)
    }

    pub fn send(&self, client_id: u32, frame: Frame) -> bool {
        self.clients
            .get(&client_id)
            .map_or(false, |client| client.send(frame))
    }

    /// Queues the same frame for every client joined to `room_id`.
    ///
    /// Returns how many clients accepted it.
    pub fn broadcast_to_room(&self, room_id: &str, frame: &Frame) -> usize {
        self.clients
            .values()
            .filter(|client| client.is_in_room(room_id))
            .filter(|client| client.send(Arc::clone(frame)))
            .count()
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    fn session(room_id: &str, player_id: u32) -> Session {
        Session {
            room_id: room_id.to_string(),
            player_id,
        }
    }

    #[test]
    fn test_client_manager_creation() {
        let manager = ClientManager::new(5);
        assert_eq!(manager.max_clients, 5);
        assert!(manager.is_empty());
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_add_multiple_clients() {
        let mut manager = ClientManager::new(3);
        let (tx, _rx) = mpsc::channel(4);

        let client_id1 = manager.add_client(test_addr(), tx.clone()).unwrap();
        let client_id2 = manager.add_client(test_addr2(), tx).unwrap();

        assert_eq!(client_id1, 1);
        assert_eq!(client_id2, 2);
        assert_eq!(manager.len(), 2);
        assert!(manager.session(client_id1).is_none());
    }

    #[test]
    fn test_add_client_max_capacity() {
        let mut manager = ClientManager::new(1);
        let (tx, _rx) = mpsc::channel(4);

        assert!(manager.add_client(test_addr(), tx.clone()).is_some());
        assert!(manager.add_client(test_addr2(), tx).is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_remove_client_returns_session() {
        let mut manager = ClientManager::new(2);
        let (tx, _rx) = mpsc::channel(4);
        let client_id = manager.add_client(test_addr(), tx).unwrap();
        manager.set_session(client_id, session("1", 10));

        let removed = manager.remove_client(&client_id).unwrap();

        assert_eq!(removed.session, Some(session("1", 10)));
        assert!(manager.is_empty());
        assert!(manager.remove_client(&client_id).is_none());
    }

    #[test]
    fn test_session_lifecycle() {
        let mut manager = ClientManager::new(2);
        let (tx, _rx) = mpsc::channel(4);
        let client_id = manager.add_client(test_addr(), tx).unwrap();

        assert!(manager.set_session(client_id, session("lobby", 3)));
        assert_eq!(manager.find_client_by_player("lobby", 3), Some(client_id));
        assert_eq!(manager.find_client_by_player("lobby", 4), None);
        assert_eq!(manager.find_client_by_player("other", 3), None);

        assert_eq!(manager.clear_session(client_id), Some(session("lobby", 3)));
        assert!(manager.session(client_id).is_none());
        assert!(!manager.set_session(999, session("lobby", 1)));
    }

    #[test]
    fn test_broadcast_only_reaches_room_members() {
        let mut manager = ClientManager::new(4);
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        let (tx3, mut rx3) = mpsc::channel(4);
        let c1 = manager.add_client(test_addr(), tx1).unwrap();
        let c2 = manager.add_client(test_addr(), tx2).unwrap();
        let _c3 = manager.add_client(test_addr(), tx3).unwrap();
        manager.set_session(c1, session("a", 1));
        manager.set_session(c2, session("b", 2));

        let frame: Frame = Arc::new(vec![1, 2, 3]);
        assert_eq!(manager.broadcast_to_room("a", &frame), 1);

        assert_eq!(*rx1.try_recv().unwrap(), vec![1, 2, 3]);
        assert!(rx2.try_recv().is_err());
        assert!(rx3.try_recv().is_err());
    }

    #[test]
    fn test_full_queue_drops_frame() {
        let mut manager = ClientManager::new(1);
        let (tx, mut rx) = mpsc::channel(1);
        let client_id = manager.add_client(test_addr(), tx).unwrap();

        assert!(manager.send(client_id, Arc::new(vec![1])));
        assert!(!manager.send(client_id, Arc::new(vec![2])));

        assert_eq!(*rx.try_recv().unwrap(), vec![1]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_to_closed_writer() {
        let mut manager = ClientManager::new(1);
        let (tx, rx) = mpsc::channel(1);
        let client_id = manager.add_client(test_addr(), tx).unwrap();
        drop(rx);

        assert!(!manager.send(client_id, Arc::new(vec![1])));
        assert!(!manager.send(42, Arc::new(vec![1])));
    }
}
