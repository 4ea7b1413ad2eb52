//! Message definitions for the circle-io protocol.
//!
//! This module contains both client->server and server->client messages.
//! Each direction has an encoder and a decoder so that either side of a
//! connection (and tests) can speak the format.

mod client;
mod server;

pub use client::*;
pub use server::*;

/// Opcodes for client -> server messages.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientOpcode {
    /// Join the game with a name and color.
    Join = 0x00,
    /// Ask whether a name is free. Answered by `NameStatus`.
    CheckName = 0x01,
    /// Locally-predicted position report.
    Move = 0x10,
}

/// Opcodes for server -> client messages.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerOpcode {
    /// The join was accepted; carries the assigned player record.
    Joined = 0x20,
    /// Reply to `CheckName`.
    NameStatus = 0x21,
    /// Full world snapshot.
    StateUpdate = 0x30,
}
