//! Connected player roster for the server
//!
//! This module tracks which TCP connections currently hold a player seat:
//! - Seat assignment, always the lowest free player id
//! - Capacity enforcement (two players per game)
//! - Copy-out of writer handles so broadcasts never hold the roster lock
//!   while writing to sockets
//!
//! The writer type is generic so the roster can be exercised without real
//! sockets.

use log::info;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Instant;

/// A player seat held by one connection
#[derive(Debug)]
pub struct Client<W> {
    /// Player id, 1 or 2
    pub id: u32,
    /// Display name sent in the join message
    pub name: String,
    pub addr: SocketAddr,
    /// Handle used to send messages to this client
    pub writer: W,
    pub connected_at: Instant,
}

impl<W> Client<W> {
    pub fn new(id: u32, addr: SocketAddr, writer: W) -> Self {
        Self {
            id,
            name: format!("Player {}", id),
            addr,
            writer,
            connected_at: Instant::now(),
        }
    }
}

/// Manages the seats of connected players
///
/// Ids are recycled: when player 1 leaves, the next connection becomes
/// player 1 again. This keeps ids inside the range the paddle layout knows
/// about.
pub struct ClientManager<W> {
    /// Connected clients indexed by player id
    clients: BTreeMap<u32, Client<W>>,
    /// Maximum number of concurrent players
    max_clients: usize,
}

impl<W: Clone> ClientManager<W> {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: BTreeMap::new(),
            max_clients,
        }
    }

    /// Seats a new connection.
    ///
    /// Returns the assigned player id, or None if every seat is taken.
    pub fn add_client(&mut self, addr: SocketAddr, writer: W) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = (1..).find(|id| !self.clients.contains_key(id))?;

        info!("Player {} connected from {}", client_id, addr);
        self.clients
            .insert(client_id, Client::new(client_id, addr, writer));

        Some(client_id)
    }

    /// Frees a seat. Returns false if the id was not seated.
    pub fn remove_client(&mut self, client_id: u32) -> bool {
        if let Some(client) = self.clients.remove(&client_id) {
            info!(
                "Player {} disconnected after {:.1}s",
                client.id,
                client.connected_at.elapsed().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    pub fn get(&self, client_id: u32) -> Option<&Client<W>> {
        self.clients.get(&client_id)
    }

    /// Writer handles of every seated client, ordered by player id.
    pub fn get_client_writers(&self) -> Vec<(u32, W)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.writer.clone()))
            .collect()
    }

    /// Empties the roster and hands back the writers.
    pub fn drain(&mut self) -> Vec<(u32, W)> {
        std::mem::take(&mut self.clients)
            .into_iter()
            .map(|(id, client)| (id, client.writer))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }
}
