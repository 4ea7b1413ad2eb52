//! Client -> Server messages.

use bytes::Bytes;

use super::ClientOpcode;
use crate::{BinaryReader, BinaryWriter, Color, ProtocolError};

/// A message sent by the browser client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Join (0x00).
    Join { name: String, color: Color },
    /// Name availability query (0x01). `request` correlates the reply.
    CheckName { request: u32, name: String },
    /// Position report (0x10).
    Move { x: f32, y: f32 },
}

impl ClientMessage {
    /// Encode into a binary frame.
    pub fn encode(&self) -> Bytes {
        let mut w = BinaryWriter::new();
        match self {
            ClientMessage::Join { name, color } => {
                w.put_u8(ClientOpcode::Join as u8);
                w.put_string_utf8(name);
                w.put_color(*color);
            }
            ClientMessage::CheckName { request, name } => {
                w.put_u8(ClientOpcode::CheckName as u8);
                w.put_u32(*request);
                w.put_string_utf8(name);
            }
            ClientMessage::Move { x, y } => {
                w.put_u8(ClientOpcode::Move as u8);
                w.put_f32(*x);
                w.put_f32(*y);
            }
        }
        w.finish()
    }

    /// Parse a client message from raw bytes.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let mut reader = BinaryReader::new(data.to_vec());
        let opcode = reader.get_u8()?;

        match opcode {
            0x00 => {
                let name = reader.get_string_utf8()?;
                let color = reader.get_color()?;
                Ok(ClientMessage::Join { name, color })
            }
            0x01 => {
                let request = reader.get_u32()?;
                let name = reader.get_string_utf8()?;
                Ok(ClientMessage::CheckName { request, name })
            }
            0x10 => {
                let x = reader.get_f32()?;
                let y = reader.get_f32()?;
                Ok(ClientMessage::Move { x, y })
            }
            _ => Err(ProtocolError::InvalidOpcode(opcode)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_layout() {
        let frame = ClientMessage::Move { x: 1.5, y: -2.0 }.encode();
        assert_eq!(frame.len(), 9);
        assert_eq!(frame[0], 0x10);
        assert_eq!(&frame[1..5], &1.5f32.to_le_bytes());
        assert_eq!(&frame[5..9], &(-2.0f32).to_le_bytes());
    }

    #[test]
    fn test_join_decodes() {
        let msg = ClientMessage::Join {
            name: "bob".into(),
            color: Color::new(0x60, 0xa5, 0xfa),
        };
        assert_eq!(ClientMessage::decode(&msg.encode()).unwrap(), msg);
    }

    #[test]
    fn test_unknown_opcode() {
        assert_eq!(
            ClientMessage::decode(&[0x7f]),
            Err(ProtocolError::InvalidOpcode(0x7f))
        );
        assert_eq!(ClientMessage::decode(&[]), Err(ProtocolError::Empty));
    }
}
