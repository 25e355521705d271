//! Wire message catalog.
//!
//! Every payload starts with one opcode byte; the fields that follow are
//! implied entirely by the opcode — no length prefixes, no padding. The
//! [`ServerMessage`] and [`ClientMessage`] encode/decode pairs below are the
//! single source of truth for each shape: any change to one of them requires
//! bumping [`PROTOCOL_VERSION`].

use glam::{IVec3, Vec3};

use super::buffer::{ByteBuf, CodecError};

pub const PROTOCOL_VERSION: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("chat text is not valid UTF-8")]
    InvalidText(#[from] std::string::FromUtf8Error),
}

/// Server-to-client message tags. The values are the wire contract; the gaps
/// are historical and must stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerOpcode {
    ConfirmAuth = 0,
    DenyAuth = 1,
    PlayerJoin = 2,
    PlayerLeave = 3,
    PlayerData = 5,
    ChunkData = 6,
    ChatMessage = 8,
    PlayerMove = 9,
}

impl TryFrom<u8> for ServerOpcode {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::ConfirmAuth),
            1 => Ok(Self::DenyAuth),
            2 => Ok(Self::PlayerJoin),
            3 => Ok(Self::PlayerLeave),
            5 => Ok(Self::PlayerData),
            6 => Ok(Self::ChunkData),
            8 => Ok(Self::ChatMessage),
            9 => Ok(Self::PlayerMove),
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

/// Client-to-server message tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClientOpcode {
    Authenticate = 0,
    Move = 1,
}

impl TryFrom<u8> for ClientOpcode {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Authenticate),
            1 => Ok(Self::Move),
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

/// Special sender ids. Anything past the reserved pair is another player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Identifier {
    System = 0,
    You = 1,
    Player = 2,
}

impl Identifier {
    pub fn classify(id: u8) -> Self {
        match id {
            0 => Self::System,
            1 => Self::You,
            _ => Self::Player,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    ConfirmAuth {
        player_id: u8,
    },
    DenyAuth {
        reason: u8,
    },
    PlayerJoin {
        player_id: u8,
    },
    PlayerLeave {
        player_id: u8,
    },
    PlayerData {
        player_id: u8,
        position: Vec3,
        yaw: f32,
        pitch: f32,
    },
    ChunkData {
        coord: IVec3,
        blocks: Vec<u8>,
    },
    ChatMessage {
        sender: u8,
        text: String,
    },
    PlayerMove {
        player_id: u8,
        position: Vec3,
        velocity: Vec3,
        yaw: f32,
        pitch: f32,
    },
}

/// Movement report for the local player, sent every tick the player is in
/// motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveUpdate {
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Authenticate { protocol_version: u8 },
    Move(MoveUpdate),
}

impl ServerMessage {
    pub fn opcode(&self) -> ServerOpcode {
        match self {
            Self::ConfirmAuth { .. } => ServerOpcode::ConfirmAuth,
            Self::DenyAuth { .. } => ServerOpcode::DenyAuth,
            Self::PlayerJoin { .. } => ServerOpcode::PlayerJoin,
            Self::PlayerLeave { .. } => ServerOpcode::PlayerLeave,
            Self::PlayerData { .. } => ServerOpcode::PlayerData,
            Self::ChunkData { .. } => ServerOpcode::ChunkData,
            Self::ChatMessage { .. } => ServerOpcode::ChatMessage,
            Self::PlayerMove { .. } => ServerOpcode::PlayerMove,
        }
    }

    pub fn encode(&self, buf: &mut ByteBuf) {
        buf.put_u8(self.opcode() as u8);
        match self {
            Self::ConfirmAuth { player_id }
            | Self::PlayerJoin { player_id }
            | Self::PlayerLeave { player_id } => buf.put_u8(*player_id),
            Self::DenyAuth { reason } => buf.put_u8(*reason),
            Self::PlayerData {
                player_id,
                position,
                yaw,
                pitch,
            } => {
                buf.put_u8(*player_id);
                buf.put_vec3(*position);
                buf.put_f32(*yaw);
                buf.put_f32(*pitch);
            }
            Self::ChunkData { coord, blocks } => {
                buf.put_ivec3(*coord);
                buf.put_bytes(blocks);
            }
            Self::ChatMessage { sender, text } => {
                buf.put_u8(*sender);
                buf.put_bytes(text.as_bytes());
            }
            Self::PlayerMove {
                player_id,
                position,
                velocity,
                yaw,
                pitch,
            } => {
                buf.put_u8(*player_id);
                buf.put_vec3(*position);
                buf.put_vec3(*velocity);
                buf.put_f32(*yaw);
                buf.put_f32(*pitch);
            }
        }
    }

    /// Reads one message starting at the buffer's read cursor. The opcode
    /// byte is consumed first; an unrecognized value is a protocol violation
    /// and nothing further is decoded from the payload.
    pub fn decode(buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        let opcode = ServerOpcode::try_from(buf.get_u8()?)?;
        let message = match opcode {
            ServerOpcode::ConfirmAuth => Self::ConfirmAuth {
                player_id: buf.get_u8()?,
            },
            ServerOpcode::DenyAuth => Self::DenyAuth {
                reason: buf.get_u8()?,
            },
            ServerOpcode::PlayerJoin => Self::PlayerJoin {
                player_id: buf.get_u8()?,
            },
            ServerOpcode::PlayerLeave => Self::PlayerLeave {
                player_id: buf.get_u8()?,
            },
            ServerOpcode::PlayerData => Self::PlayerData {
                player_id: buf.get_u8()?,
                position: buf.get_vec3()?,
                yaw: buf.get_f32()?,
                pitch: buf.get_f32()?,
            },
            ServerOpcode::ChunkData => Self::ChunkData {
                coord: buf.get_ivec3()?,
                blocks: take_remaining(buf)?,
            },
            ServerOpcode::ChatMessage => Self::ChatMessage {
                sender: buf.get_u8()?,
                text: String::from_utf8(take_remaining(buf)?)?,
            },
            ServerOpcode::PlayerMove => Self::PlayerMove {
                player_id: buf.get_u8()?,
                position: buf.get_vec3()?,
                velocity: buf.get_vec3()?,
                yaw: buf.get_f32()?,
                pitch: buf.get_f32()?,
            },
        };
        Ok(message)
    }
}

impl ClientMessage {
    pub fn opcode(&self) -> ClientOpcode {
        match self {
            Self::Authenticate { .. } => ClientOpcode::Authenticate,
            Self::Move(_) => ClientOpcode::Move,
        }
    }

    pub fn encode(&self, buf: &mut ByteBuf) {
        buf.put_u8(self.opcode() as u8);
        match self {
            Self::Authenticate { protocol_version } => buf.put_u8(*protocol_version),
            Self::Move(update) => {
                buf.put_vec3(update.position);
                buf.put_vec3(update.velocity);
                buf.put_f32(update.yaw);
                buf.put_f32(update.pitch);
            }
        }
    }

    pub fn decode(buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        let opcode = ClientOpcode::try_from(buf.get_u8()?)?;
        let message = match opcode {
            ClientOpcode::Authenticate => Self::Authenticate {
                protocol_version: buf.get_u8()?,
            },
            ClientOpcode::Move => Self::Move(MoveUpdate {
                position: buf.get_vec3()?,
                velocity: buf.get_vec3()?,
                yaw: buf.get_f32()?,
                pitch: buf.get_f32()?,
            }),
        };
        Ok(message)
    }
}

/// Variable-length tails consume whatever the payload has left.
fn take_remaining(buf: &mut ByteBuf) -> Result<Vec<u8>, CodecError> {
    let mut rest = vec![0u8; buf.bytes_remaining()];
    buf.get_bytes(&mut rest)?;
    Ok(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_values_are_the_wire_contract() {
        assert_eq!(ServerOpcode::ConfirmAuth as u8, 0);
        assert_eq!(ServerOpcode::DenyAuth as u8, 1);
        assert_eq!(ServerOpcode::PlayerJoin as u8, 2);
        assert_eq!(ServerOpcode::PlayerLeave as u8, 3);
        assert_eq!(ServerOpcode::PlayerData as u8, 5);
        assert_eq!(ServerOpcode::ChunkData as u8, 6);
        assert_eq!(ServerOpcode::ChatMessage as u8, 8);
        assert_eq!(ServerOpcode::PlayerMove as u8, 9);

        assert_eq!(ClientOpcode::Authenticate as u8, 0);
        assert_eq!(ClientOpcode::Move as u8, 1);
    }

    #[test]
    fn gaps_in_the_catalog_stay_unknown() {
        assert!(matches!(
            ServerOpcode::try_from(4),
            Err(ProtocolError::UnknownOpcode(4))
        ));
        assert!(matches!(
            ServerOpcode::try_from(7),
            Err(ProtocolError::UnknownOpcode(7))
        ));
    }

    #[test]
    fn player_move_round_trip() {
        let original = ServerMessage::PlayerMove {
            player_id: 3,
            position: Vec3::new(1.0, 2.0, 3.0),
            velocity: Vec3::new(0.5, -0.5, 0.0),
            yaw: 1.25,
            pitch: -0.25,
        };

        let mut buf = ByteBuf::new();
        original.encode(&mut buf);
        assert_eq!(buf.len(), 1 + 1 + 12 + 12 + 4 + 4);

        let decoded = ServerMessage::decode(&mut buf).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(buf.bytes_remaining(), 0);
    }

    #[test]
    fn unknown_opcode_is_a_protocol_violation() {
        let mut buf = ByteBuf::from_bytes(&[0xFF, 1, 2, 3]);
        assert!(matches!(
            ServerMessage::decode(&mut buf),
            Err(ProtocolError::UnknownOpcode(0xFF))
        ));
        // Only the opcode byte was consumed; nothing else was decoded.
        assert_eq!(buf.read_pos(), 1);
    }

    #[test]
    fn truncated_payload_reports_underrun() {
        let full = ServerMessage::PlayerMove {
            player_id: 1,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
        };
        let mut buf = ByteBuf::new();
        full.encode(&mut buf);

        let mut truncated = ByteBuf::from_bytes(&buf.as_slice()[..10]);
        assert!(matches!(
            ServerMessage::decode(&mut truncated),
            Err(ProtocolError::Codec(CodecError::Underrun { .. }))
        ));
    }

    #[test]
    fn chat_message_carries_sender_and_text() {
        let original = ServerMessage::ChatMessage {
            sender: Identifier::System as u8,
            text: "server restarting".to_owned(),
        };
        let mut buf = ByteBuf::new();
        original.encode(&mut buf);

        let decoded = ServerMessage::decode(&mut buf).unwrap();
        assert_eq!(decoded, original);
        if let ServerMessage::ChatMessage { sender, .. } = decoded {
            assert_eq!(Identifier::classify(sender), Identifier::System);
        }
    }

    #[test]
    fn chunk_data_takes_the_remaining_bytes() {
        let original = ServerMessage::ChunkData {
            coord: IVec3::new(-2, 0, 7),
            blocks: vec![1, 1, 2, 0, 3],
        };
        let mut buf = ByteBuf::new();
        original.encode(&mut buf);
        assert_eq!(ServerMessage::decode(&mut buf).unwrap(), original);
    }

    #[test]
    fn authenticate_carries_the_protocol_version() {
        let mut buf = ByteBuf::new();
        ClientMessage::Authenticate {
            protocol_version: PROTOCOL_VERSION,
        }
        .encode(&mut buf);
        assert_eq!(buf.as_slice(), &[0, PROTOCOL_VERSION]);

        let decoded = ClientMessage::decode(&mut buf).unwrap();
        assert_eq!(
            decoded,
            ClientMessage::Authenticate {
                protocol_version: PROTOCOL_VERSION
            }
        );
    }

    #[test]
    fn client_move_round_trip() {
        let update = MoveUpdate {
            position: Vec3::new(4.0, 64.0, -3.5),
            velocity: Vec3::new(0.0, -9.8, 0.0),
            yaw: 3.0,
            pitch: 0.1,
        };
        let mut buf = ByteBuf::new();
        ClientMessage::Move(update).encode(&mut buf);
        assert_eq!(
            ClientMessage::decode(&mut buf).unwrap(),
            ClientMessage::Move(update)
        );
    }

    #[test]
    fn sender_classification() {
        assert_eq!(Identifier::classify(0), Identifier::System);
        assert_eq!(Identifier::classify(1), Identifier::You);
        assert_eq!(Identifier::classify(2), Identifier::Player);
        assert_eq!(Identifier::classify(200), Identifier::Player);
    }
}
