use std::io;
use std::time::Duration;
use thiserror::Error;

/// Transport failures. These are fatal to the operation that hit them.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    #[error("failed to connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("failed to write to peer: {0}")]
    Write(#[source] io::Error),

    #[error("write to peer timed out after {0:?}")]
    WriteTimeout(Duration),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A single undecodable message. The connection it arrived on stays open.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown message type `{0}`")]
    UnknownType(String),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("paddle slot must be in 1..=4, got {0}")]
pub struct InvalidSlot(pub u8);
