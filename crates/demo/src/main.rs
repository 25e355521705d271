//! Deterministic walkthrough of the client core over the loopback transport:
//! a scripted authority feeds the full message catalog while a hand-cranked
//! clock drives the fixed-timestep loop.

use std::collections::HashMap;

use glam::{IVec3, Vec3};

use strata::net::{
    ByteBuf, ClientMessage, Identifier, LoopbackTransport, MoveUpdate, ServerMessage,
};
use strata::simulation::{
    Buttons, ClientLoop, ExitReason, Frontend, InputSample, LoopConfig, ManualClock, World,
};

#[derive(Debug, Default)]
struct DemoWorld {
    local_id: Option<u8>,
    players: HashMap<u8, Vec3>,
    chunks: usize,
    chat_lines: usize,
    ticks: u64,
    position: Vec3,
}

impl World for DemoWorld {
    fn apply(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::ConfirmAuth { player_id } => {
                log::info!("authenticated as player {player_id}");
                self.local_id = Some(player_id);
            }
            ServerMessage::DenyAuth { .. } => {}
            ServerMessage::PlayerJoin { player_id } => {
                self.players.insert(player_id, Vec3::ZERO);
            }
            ServerMessage::PlayerLeave { player_id } => {
                self.players.remove(&player_id);
            }
            ServerMessage::PlayerData {
                player_id,
                position,
                ..
            }
            | ServerMessage::PlayerMove {
                player_id,
                position,
                ..
            } => {
                self.players.insert(player_id, position);
            }
            ServerMessage::ChunkData { coord, blocks } => {
                log::info!("chunk {coord}: {} block bytes", blocks.len());
                self.chunks += 1;
            }
            ServerMessage::ChatMessage { sender, text } => {
                self.chat_lines += 1;
                match Identifier::classify(sender) {
                    Identifier::System => log::info!("[server] {text}"),
                    _ => log::info!("[{sender}] {text}"),
                }
            }
        }
    }

    fn tick(&mut self, input: &InputSample, dt: f32) -> Option<MoveUpdate> {
        self.ticks += 1;
        let velocity = input.wish_direction() * 4.5;
        self.position += velocity * dt;
        (velocity.length_squared() > f32::EPSILON).then(|| MoveUpdate {
            position: self.position,
            velocity,
            yaw: input.yaw,
            pitch: input.pitch,
        })
    }
}

/// Always walks forward; never asks to close (the script disconnects instead).
struct ScriptedFrontend;

impl Frontend<DemoWorld> for ScriptedFrontend {
    fn sample(&mut self) -> InputSample {
        InputSample {
            buttons: Buttons::FORWARD,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    fn present(&mut self, world: &DemoWorld, alpha: f32) {
        log::debug!(
            "frame: pos {:.2} alpha {alpha:.2} ({} ticks)",
            world.position.x,
            world.ticks
        );
    }

    fn close_requested(&mut self) -> bool {
        false
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let (transport, peer) = LoopbackTransport::pair();
    let mut client = ClientLoop::new(
        LoopConfig::default(),
        DemoWorld::default(),
        transport,
        ScriptedFrontend,
        ManualClock::new(),
    );

    // The authority's opening volley.
    peer.connect();
    peer.deliver(&ServerMessage::ConfirmAuth { player_id: 1 });
    peer.deliver(&ServerMessage::ChatMessage {
        sender: Identifier::System as u8,
        text: "welcome to the outpost".to_owned(),
    });
    peer.deliver(&ServerMessage::PlayerJoin { player_id: 2 });
    peer.deliver(&ServerMessage::PlayerData {
        player_id: 2,
        position: Vec3::new(8.0, 0.0, -3.0),
        yaw: 0.0,
        pitch: 0.0,
    });
    peer.deliver(&ServerMessage::ChunkData {
        coord: IVec3::new(0, 0, 0),
        blocks: vec![1; 256],
    });

    // Three simulated seconds at sixty frames each; player 2 wanders while
    // the local player walks forward.
    let dt = 1.0 / 60.0;
    for frame in 0..180u32 {
        if frame % 30 == 0 {
            peer.deliver(&ServerMessage::PlayerMove {
                player_id: 2,
                position: Vec3::new(8.0 + frame as f32 * 0.05, 0.0, -3.0),
                velocity: Vec3::X * 3.0,
                yaw: 0.0,
                pitch: 0.0,
            });
        }
        client.clock_mut().advance(dt);
        client.iterate()?;
    }

    let sent = peer.take_sent();
    let mut auths = 0usize;
    let mut moves = 0usize;
    for (payload, _reliable) in &sent {
        let mut buf = ByteBuf::from_bytes(payload);
        match ClientMessage::decode(&mut buf)? {
            ClientMessage::Authenticate { .. } => auths += 1,
            ClientMessage::Move(_) => moves += 1,
        }
    }

    let world = client.world();
    log::info!(
        "after 180 frames: {} ticks, walked to x={:.2}, {} players tracked, \
         {} chunks, {} chat lines",
        world.ticks,
        world.position.x,
        world.players.len(),
        world.chunks,
        world.chat_lines,
    );
    log::info!("sent {auths} authenticate and {moves} movement messages");

    // The authority goes away; the loop winds down cleanly.
    peer.disconnect();
    let reason = client.run()?;
    assert_eq!(reason, ExitReason::Disconnected);
    log::info!("disconnected, shutting down");

    Ok(())
}
