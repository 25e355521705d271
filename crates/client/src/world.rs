use std::collections::HashMap;

use glam::{IVec3, Vec3};

use strata::net::{Identifier, MoveUpdate, ServerMessage};
use strata::simulation::{Buttons, InputSample, World};

const WALK_SPEED: f32 = 4.5;
const SNEAK_FACTOR: f32 = 0.3;

/// Authoritative state for another player. The previous position is kept so
/// presentation can blend between the last two known states.
#[derive(Debug, Clone, Copy)]
pub struct RemotePlayer {
    pub previous: Vec3,
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl RemotePlayer {
    fn at(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            previous: position,
            position,
            velocity: Vec3::ZERO,
            yaw,
            pitch,
        }
    }

    pub fn render_position(&self, alpha: f32) -> Vec3 {
        self.previous.lerp(self.position, alpha)
    }
}

/// Client-side world: the local player's kinematic state plus everything the
/// authority has told us about.
#[derive(Debug, Default)]
pub struct ClientWorld {
    pub local_id: Option<u8>,
    pub players: HashMap<u8, RemotePlayer>,
    pub chunks: HashMap<IVec3, Vec<u8>>,
    previous_position: Vec3,
    pub position: Vec3,
    pub velocity: Vec3,
    yaw: f32,
    pitch: f32,
}

impl ClientWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local player position for the current frame, blended between the last
    /// two simulated states.
    pub fn render_position(&self, alpha: f32) -> Vec3 {
        self.previous_position.lerp(self.position, alpha)
    }
}

impl World for ClientWorld {
    fn apply(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::ConfirmAuth { player_id } => {
                log::info!("authenticated as player {player_id}");
                self.local_id = Some(player_id);
            }
            // Refusals are consumed by the loop before they reach the world.
            ServerMessage::DenyAuth { .. } => {}
            ServerMessage::PlayerJoin { player_id } => {
                log::info!("player {player_id} joined");
                self.players
                    .insert(player_id, RemotePlayer::at(Vec3::ZERO, 0.0, 0.0));
            }
            ServerMessage::PlayerLeave { player_id } => {
                log::info!("player {player_id} left");
                self.players.remove(&player_id);
            }
            ServerMessage::PlayerData {
                player_id,
                position,
                yaw,
                pitch,
            } => {
                self.players
                    .insert(player_id, RemotePlayer::at(position, yaw, pitch));
            }
            ServerMessage::ChunkData { coord, blocks } => {
                log::debug!("chunk {coord} ({} bytes)", blocks.len());
                self.chunks.insert(coord, blocks);
            }
            ServerMessage::ChatMessage { sender, text } => match Identifier::classify(sender) {
                Identifier::System => log::info!("[server] {text}"),
                _ => log::info!("[{sender}] {text}"),
            },
            ServerMessage::PlayerMove {
                player_id,
                position,
                velocity,
                yaw,
                pitch,
            } => {
                let player = self
                    .players
                    .entry(player_id)
                    .or_insert_with(|| RemotePlayer::at(position, yaw, pitch));
                player.previous = player.position;
                player.position = position;
                player.velocity = velocity;
                player.yaw = yaw;
                player.pitch = pitch;
            }
        }
    }

    fn tick(&mut self, input: &InputSample, dt: f32) -> Option<MoveUpdate> {
        self.previous_position = self.position;
        self.yaw = input.yaw;
        self.pitch = input.pitch;

        let mut speed = WALK_SPEED;
        if input.buttons.contains(Buttons::SNEAK) {
            speed *= SNEAK_FACTOR;
        }
        self.velocity = input.wish_direction() * speed;
        self.position += self.velocity * dt;

        (self.velocity.length_squared() > f32::EPSILON).then(|| MoveUpdate {
            position: self.position,
            velocity: self.velocity,
            yaw: self.yaw,
            pitch: self.pitch,
        })
    }
}
