//! Server -> Client messages.

use bytes::Bytes;

use super::ServerOpcode;
use crate::{BinaryReader, BinaryWriter, Food, Player, Position, ProtocolError, Snapshot};

/// A message broadcast or replied by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Join accepted (0x20).
    Joined(Player),
    /// Reply to a `CheckName` request (0x21).
    NameStatus { request: u32, available: bool },
    /// Full snapshot (0x30).
    StateUpdate(Snapshot),
}

fn put_player(w: &mut BinaryWriter, p: &Player) {
    w.put_u32(p.id);
    w.put_string_utf8(&p.name);
    w.put_color(p.color);
    w.put_f32(p.position.x);
    w.put_f32(p.position.y);
    w.put_f32(p.radius);
    w.put_u32(p.score);
}

fn get_player(r: &mut BinaryReader) -> Result<Player, ProtocolError> {
    let id = r.get_u32()?;
    let name = r.get_string_utf8()?;
    let color = r.get_color()?;
    let x = r.get_f32()?;
    let y = r.get_f32()?;
    let radius = r.get_f32()?;
    let score = r.get_u32()?;
    Ok(Player {
        id,
        name,
        color,
        position: Position::new(x, y),
        radius,
        score,
    })
}

fn put_food(w: &mut BinaryWriter, f: &Food) {
    w.put_f32(f.position.x);
    w.put_f32(f.position.y);
    w.put_f32(f.radius);
    w.put_color(f.color);
}

fn get_food(r: &mut BinaryReader) -> Result<Food, ProtocolError> {
    let x = r.get_f32()?;
    let y = r.get_f32()?;
    let radius = r.get_f32()?;
    let color = r.get_color()?;
    Ok(Food {
        position: Position::new(x, y),
        radius,
        color,
    })
}

impl ServerMessage {
    /// Encode into a binary frame.
    ///
    /// Counts are u16 on the wire; lists longer than `u16::MAX` are cut.
    pub fn encode(&self) -> Bytes {
        let mut w = BinaryWriter::new();
        match self {
            ServerMessage::Joined(player) => {
                w.put_u8(ServerOpcode::Joined as u8);
                put_player(&mut w, player);
            }
            ServerMessage::NameStatus { request, available } => {
                w.put_u8(ServerOpcode::NameStatus as u8);
                w.put_u32(*request);
                w.put_u8(u8::from(*available));
            }
            ServerMessage::StateUpdate(snapshot) => {
                w.put_u8(ServerOpcode::StateUpdate as u8);
                let players = &snapshot.players[..snapshot.players.len().min(u16::MAX as usize)];
                w.put_u16(players.len() as u16);
                for p in players {
                    put_player(&mut w, p);
                }
                let foods = &snapshot.foods[..snapshot.foods.len().min(u16::MAX as usize)];
                w.put_u16(foods.len() as u16);
                for f in foods {
                    put_food(&mut w, f);
                }
            }
        }
        w.finish()
    }

    /// Parse a server message from raw bytes.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let mut reader = BinaryReader::new(data.to_vec());
        let opcode = reader.get_u8()?;

        match opcode {
            0x20 => Ok(ServerMessage::Joined(get_player(&mut reader)?)),
            0x21 => {
                let request = reader.get_u32()?;
                let available = reader.get_u8()? != 0;
                Ok(ServerMessage::NameStatus { request, available })
            }
            0x30 => {
                let player_count = reader.get_u16()? as usize;
                let mut players = Vec::with_capacity(player_count);
                for _ in 0..player_count {
                    players.push(get_player(&mut reader)?);
                }
                let food_count = reader.get_u16()? as usize;
                let mut foods = Vec::with_capacity(food_count);
                for _ in 0..food_count {
                    foods.push(get_food(&mut reader)?);
                }
                Ok(ServerMessage::StateUpdate(Snapshot { players, foods }))
            }
            _ => Err(ProtocolError::InvalidOpcode(opcode)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    fn player(id: u32, name: &str) -> Player {
        Player {
            id,
            name: name.to_string(),
            color: Color::new(1, 2, 3),
            position: Position::new(10.0, 20.0),
            radius: 15.0,
            score: 4,
        }
    }

    #[test]
    fn test_state_update_decodes() {
        let snapshot = Snapshot {
            players: vec![player(1, "a"), player(2, "b")],
            foods: vec![Food {
                position: Position::new(150.0, 250.0),
                radius: 5.0,
                color: Color::new(0xf4, 0x72, 0xb6),
            }],
        };
        let frame = ServerMessage::StateUpdate(snapshot.clone()).encode();
        assert_eq!(
            ServerMessage::decode(&frame).unwrap(),
            ServerMessage::StateUpdate(snapshot)
        );
    }

    #[test]
    fn test_truncated_snapshot_is_rejected() {
        let frame = ServerMessage::StateUpdate(Snapshot {
            players: vec![player(7, "x")],
            foods: vec![],
        })
        .encode();
        let cut = &frame[..frame.len() - 3];
        assert_eq!(ServerMessage::decode(cut), Err(ProtocolError::UnexpectedEof));
    }

    #[test]
    fn test_name_status() {
        assert_eq!(
            ServerMessage::decode(&[0x21, 9, 0, 0, 0, 1]).unwrap(),
            ServerMessage::NameStatus { request: 9, available: true }
        );
    }
}
