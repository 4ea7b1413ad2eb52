//! Shared protocol crate for circle-io.
//!
//! This crate contains:
//! - Binary reading/writing utilities
//! - Message definitions and codecs for both directions
//! - Shared world types (Color, Player, Food, Snapshot)

mod binary;
mod error;
pub mod packets;

use std::fmt;
use std::str::FromStr;

pub use binary::{BinaryReader, BinaryWriter};
pub use error::ProtocolError;

/// Represents a 2D position using glam's Vec2.
pub type Position = glam::Vec2;

/// RGB color used for players and food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or the short `#rgb` form. The leading `#` is optional.
    pub fn from_hex(s: &str) -> Result<Self, ProtocolError> {
        let invalid = || ProtocolError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                // #abc expands to #aabbcc
                let r = channel(&hex[0..1])?;
                let g = channel(&hex[1..2])?;
                let b = channel(&hex[2..3])?;
                Ok(Self::new(r * 17, g * 17, b * 17))
            }
            _ => Err(invalid()),
        }
    }

    /// Lowercase `#rrggbb`, the form canvas fill styles accept.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// A player as broadcast by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub color: Color,
    pub position: Position,
    pub radius: f32,
    pub score: u32,
}

/// A passive food item. Server-owned; clients only draw it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Food {
    pub position: Position,
    pub radius: f32,
    pub color: Color,
}

/// Full world state at one server instant. Always replaces, never merges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub players: Vec<Player>,
    pub foods: Vec<Food>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Color::from_hex("#60A5FA").unwrap(), Color::new(0x60, 0xa5, 0xfa));
        assert_eq!(Color::from_hex("34d399").unwrap(), Color::new(0x34, 0xd3, 0x99));
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::new(255, 255, 255));
        assert_eq!("#0f172a".parse::<Color>().unwrap().to_hex(), "#0f172a");
    }

    #[test]
    fn test_bad_hex_is_rejected() {
        for bad in ["", "#", "#12345", "#gggggg", "#ééé", "red"] {
            assert!(Color::from_hex(bad).is_err(), "{bad:?} should not parse");
        }
    }
}
