//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding a message frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid message opcode: {0:#04x}")]
    InvalidOpcode(u8),

    #[error("Unexpected end of data")]
    UnexpectedEof,

    #[error("Empty frame")]
    Empty,

    #[error("Invalid color: {0}")]
    InvalidColor(String),
}
