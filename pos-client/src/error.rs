//! Client error types

use shared::models::OrderStatus;
use thiserror::Error;

/// Transport channel error type
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Connection could not be established
    #[error("Connection error: {0}")]
    Connection(String),

    /// Underlying socket error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing violation (oversized or truncated frame)
    #[error("Frame error: {0}")]
    Frame(#[from] shared::frame::FrameError),

    /// Inbound frame did not parse as a sync event; the frame is
    /// discarded and the connection stays up
    #[error("Invalid frame: {0}")]
    InvalidFrame(#[from] serde_json::Error),

    /// Peer closed the connection
    #[error("Connection closed by peer")]
    Closed,
}

/// Domain store error type
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    /// Mutation targeted an id the store does not hold
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected order lifecycle transition
    #[error("Illegal order transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// Invalid mutation payload
    #[error("Validation error: {0}")]
    Validation(String),
}
