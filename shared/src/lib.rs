//! # Shared Game Types
//!
//! Everything the pong server and client must agree on lives here: the
//! entity model that the authoritative simulation mutates, the settings a
//! game is played with, and the newline-delimited wire protocol both peers
//! speak.
//!
//! ## Field Geometry
//! The field is a square of `field_size` units with the origin at the top
//! left corner. Four paddles are mounted on its edges, two per player:
//! player 1 defends the left and top edges, player 2 the right and bottom
//! edges. A ball that reaches an edge scores for the player who does *not*
//! own the paddle in front of it.
//!
//! ## Modules
//! - `ball`: ball motion, wall and paddle collision response
//! - `paddle`: paddle slots and axis-constrained movement
//! - `settings`: per-game settings and score counters
//! - `protocol`: message schemas and line-oriented encode/decode
//! - `error`: transport and protocol error types

pub mod ball;
pub mod error;
pub mod paddle;
pub mod protocol;
pub mod settings;

pub use ball::{Ball, Wall};
pub use error::{InvalidSlot, NetError, ProtocolError};
pub use paddle::{Paddle, PaddleSlot};
pub use protocol::{
    EndMessage, InputMessage, JoinMessage, Message, MessageKind, StartMessage, StateMessage,
};
pub use settings::{GameSettings, Scores};

pub const BALL_RADIUS: f32 = 8.0;
pub const PADDLE_LENGTH: f32 = 100.0;
pub const PADDLE_THICKNESS: f32 = 20.0;

/// Half-width of the uniform jitter added to each velocity component on a
/// paddle hit.
pub const PADDLE_DEFLECTION_JITTER: f32 = 0.25;

/// Simulation and input send rate in Hz.
pub const TICK_RATE: u32 = 60;

/// Maximum number of simultaneously connected players.
pub const MAX_PLAYERS: usize = 2;

/// Capacity of the client's pending input queue.
pub const INPUT_QUEUE_CAPACITY: usize = 100;
