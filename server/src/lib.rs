//! # Pong Server Library
//!
//! This library is the authoritative side of a two-player networked pong
//! game. It owns the only mutable copy of the world, advances it at a fixed
//! tick rate, and streams the result to both connected players.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Ball motion, wall and paddle collisions, scoring and the end of the game
//! are all decided here. Clients only ever mirror what the server sends.
//!
//! ### Session Management
//! A session seats at most two players. The first connection becomes
//! player 1, the second player 2, and a third concurrent connection is
//! closed immediately. When the second player arrives the world is
//! initialized and the game starts; when a player leaves mid-game the game
//! is aborted and the remaining player is told so.
//!
//! ### State Broadcasting
//! After every simulation tick the full world snapshot is sent to both
//! players as one line of JSON. The final tick is followed by an `end`
//! message carrying the winner and the final scores.
//!
//! ## Architecture Design
//!
//! ### Task Layout
//! - **Accept loop**: seats new connections and triggers the game start
//! - **Read tasks**: one per connection, decoding input lines and moving
//!   that player's paddles
//! - **Tick loop**: drives the simulation controller on an interval and
//!   broadcasts each new snapshot
//!
//! ### Shared World
//! The world sits behind a single reader/writer lock. Input tasks take the
//! write lock to move paddles, the simulation takes it for a whole tick, and
//! broadcasters copy a complete snapshot under the read lock. No task reads
//! individual fields outside the lock.
//!
//! ### TCP Line Protocol
//! Connections are plain TCP carrying newline-delimited JSON messages (see
//! `pong_shared::protocol`). Malformed or unknown lines are logged and
//! dropped; the connection stays open.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Player seats, id assignment and writer copy-out for broadcasts.
//!
//! ### Game Module (`game`)
//! The world state, its rules (initialization, scoring, termination) and
//! the locked `World` handle.
//!
//! ### Simulation Module (`simulation`)
//! The fixed-rate controller and the per-tick collision step.
//!
//! ### Network Module (`network`)
//! Listener, per-connection tasks, session phases and broadcasting.
//!
//! ### Config Module (`config`)
//! Command line flags and the resulting `ServerConfig`.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use pong_server::config::ServerConfig;
//! use pong_server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         addr: "127.0.0.1:8080".to_string(),
//!         ..ServerConfig::default()
//!     };
//!
//!     let mut server = Server::bind(&config).await?;
//!     server.start();
//!
//!     tokio::signal::ctrl_c().await?;
//!     server.stop().await;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod game;
pub mod network;
pub mod simulation;
