//! # Pong Client Library
//!
//! This library is the networked half of a pong client. It connects to the
//! authoritative server, mirrors the world the server broadcasts, and sends
//! the local player's paddle positions back. Drawing the field and reading
//! the keyboard are left to the embedding application.
//!
//! ## Architecture Overview
//!
//! ### Mirrored State
//! The client never simulates. Every `state` message replaces the local copy
//! of balls, paddles and scores, and the presentation layer reads that copy
//! through `GameClient::snapshot`.
//!
//! ### Rate-Limited Input
//! Inputs are queued without blocking and a send task transmits at most one
//! per tick, always the most recent. A full queue drops the newest input
//! instead of stalling the caller.
//!
//! ### Event Hooks
//! `ClientEvents` lets the application react to join, start, state and end
//! messages as they arrive, after the mirror has been updated.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! `MirroredState`, the read-only copy of the server's world.
//!
//! ### Input Module (`input`)
//! The `InputSink` capability, axis-constrained `PaddleSteering` and a
//! simple ball-chasing helper.
//!
//! ### Network Module (`network`)
//! `GameClient` with its receive and send tasks, and the `ClientEvents`
//! trait.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use pong_client::input::{InputSink, PaddleSteering};
//! use pong_client::network::{GameClient, NoEvents};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = GameClient::connect("127.0.0.1:8080", Arc::new(NoEvents)).await?;
//!
//!     // Once the game has started, move the vertical paddle down a step.
//!     let state = client.snapshot();
//!     if let Some(mut steering) = PaddleSteering::from_state(&state) {
//!         steering.steer(0.0, 1.0, &client);
//!     }
//!
//!     client.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;

pub use game::MirroredState;
pub use input::{InputSink, NoopInput, PaddleSteering};
pub use network::{ClientEvents, GameClient, NoEvents};
