//! The client's outer loop: input sampling, transport polling and packet
//! dispatch, fixed-timestep simulation with bounded catch-up, and frame
//! presentation with an interpolation factor.

use std::io;

use crate::net::{
    ByteBuf, ClientMessage, ProtocolError, ServerMessage, Transport, TransportEvent,
    PROTOCOL_VERSION,
};

use super::input::InputSample;
use super::tick::{FixedTimestep, DEFAULT_MAX_FRAMESKIP, DEFAULT_TICK_RATE};
use super::time::Clock;

/// The simulation layer. Decoded server messages are applied between ticks;
/// each tick integrates one fixed step and may report the local player's
/// movement for the authority.
pub trait World {
    fn apply(&mut self, message: ServerMessage);
    fn tick(&mut self, input: &InputSample, dt: f32) -> Option<crate::net::MoveUpdate>;
}

/// Rendering and input collaborator. `present` receives the interpolation
/// factor: how far between the last simulated tick and the next the frame
/// falls, so visuals can smooth over the coarser simulation rate.
pub trait Frontend<W> {
    fn sample(&mut self) -> InputSample;
    fn present(&mut self, world: &W, alpha: f32);
    fn close_requested(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    pub tick_rate: u32,
    pub max_frameskip: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            max_frameskip: DEFAULT_MAX_FRAMESKIP,
        }
    }
}

/// Why the loop stopped. All three are orderly shutdowns; protocol and I/O
/// failures surface as [`ClientError`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Disconnected,
    AuthDenied,
    CloseRequested,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

pub struct ClientLoop<W, T, F, C> {
    world: W,
    transport: T,
    frontend: F,
    clock: C,
    timestep: FixedTimestep,
    last_time: Option<f64>,
    exit: Option<ExitReason>,
    scratch: ByteBuf,
}

impl<W, T, F, C> ClientLoop<W, T, F, C>
where
    W: World,
    T: Transport,
    F: Frontend<W>,
    C: Clock,
{
    pub fn new(config: LoopConfig, world: W, transport: T, frontend: F, clock: C) -> Self {
        Self {
            world,
            transport,
            frontend,
            clock,
            timestep: FixedTimestep::new(config.tick_rate, config.max_frameskip),
            last_time: None,
            exit: None,
            scratch: ByteBuf::with_capacity(64),
        }
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn timestep(&self) -> &FixedTimestep {
        &self.timestep
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.exit
    }

    /// Drives iterations until an orderly exit or a fatal error, then closes
    /// the transport exactly once. There is no automatic reconnect.
    pub fn run(&mut self) -> Result<ExitReason, ClientError> {
        let result = loop {
            match self.iterate() {
                Ok(()) => {
                    if let Some(reason) = self.exit {
                        break Ok(reason);
                    }
                }
                Err(e) => break Err(e),
            }
        };
        self.transport.close();
        result
    }

    /// One outer iteration: sample, pump the network, run up to the capped
    /// number of simulation ticks, present with the interpolation factor,
    /// then observe the close request.
    pub fn iterate(&mut self) -> Result<(), ClientError> {
        let input = self.frontend.sample();

        self.pump_network()?;

        // Wall time is sampled once per iteration; the first frame banks
        // nothing.
        let now = self.clock.now();
        let delta = self.last_time.map_or(0.0, |last| now - last);
        self.last_time = Some(now);

        self.timestep.begin_frame(delta);
        while self.timestep.consume_tick() {
            let dt = self.timestep.dt() as f32;
            if let Some(update) = self.world.tick(&input, dt) {
                self.send(&ClientMessage::Move(update), false)?;
            }
        }

        self.frontend.present(&self.world, self.timestep.alpha());

        if self.frontend.close_requested() && self.exit.is_none() {
            self.exit = Some(ExitReason::CloseRequested);
        }

        Ok(())
    }

    fn pump_network(&mut self) -> Result<(), ClientError> {
        for event in self.transport.poll()? {
            match event {
                TransportEvent::Connected => {
                    log::info!("connected, authenticating");
                    self.send(
                        &ClientMessage::Authenticate {
                            protocol_version: PROTOCOL_VERSION,
                        },
                        true,
                    )?;
                }
                TransportEvent::Disconnected => {
                    log::info!("transport disconnected");
                    self.exit.get_or_insert(ExitReason::Disconnected);
                }
                TransportEvent::Message(payload) => self.dispatch(&payload)?,
            }
        }
        Ok(())
    }

    /// Decodes one payload and routes it by opcode. A malformed or unknown
    /// payload is fatal to the connection: the error propagates, `run` closes
    /// the transport, and no resynchronization is attempted on the stream.
    fn dispatch(&mut self, payload: &[u8]) -> Result<(), ClientError> {
        let mut buf = ByteBuf::from_bytes(payload);
        let message = match ServerMessage::decode(&mut buf) {
            Ok(message) => message,
            Err(e) => {
                log::error!("protocol violation: {e}");
                return Err(e.into());
            }
        };

        match message {
            ServerMessage::DenyAuth { reason } => {
                // A refusal is a normal termination, not a protocol failure.
                log::warn!("authentication denied (reason {reason})");
                self.exit.get_or_insert(ExitReason::AuthDenied);
            }
            other => self.world.apply(other),
        }
        Ok(())
    }

    fn send(&mut self, message: &ClientMessage, reliable: bool) -> Result<(), ClientError> {
        self.scratch.clear();
        message.encode(&mut self.scratch);
        self.transport.send(self.scratch.as_slice(), reliable)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{LoopbackPeer, LoopbackTransport, MoveUpdate};
    use crate::simulation::time::ManualClock;
    use glam::Vec3;

    #[derive(Default)]
    struct RecordingWorld {
        applied: Vec<ServerMessage>,
        ticks: u32,
        report_moves: bool,
    }

    impl World for RecordingWorld {
        fn apply(&mut self, message: ServerMessage) {
            self.applied.push(message);
        }

        fn tick(&mut self, _input: &InputSample, _dt: f32) -> Option<MoveUpdate> {
            self.ticks += 1;
            self.report_moves.then(|| MoveUpdate {
                position: Vec3::new(self.ticks as f32, 0.0, 0.0),
                velocity: Vec3::X,
                yaw: 0.0,
                pitch: 0.0,
            })
        }
    }

    #[derive(Default)]
    struct NullFrontend {
        close_after_frames: Option<u32>,
        frames: u32,
    }

    impl Frontend<RecordingWorld> for NullFrontend {
        fn sample(&mut self) -> InputSample {
            InputSample::default()
        }

        fn present(&mut self, _world: &RecordingWorld, alpha: f32) {
            self.frames += 1;
            assert!((0.0..=1.0).contains(&alpha));
        }

        fn close_requested(&mut self) -> bool {
            self.close_after_frames
                .is_some_and(|frames| self.frames >= frames)
        }
    }

    fn new_loop(
        peer_setup: impl FnOnce(&LoopbackPeer),
    ) -> (
        ClientLoop<RecordingWorld, LoopbackTransport, NullFrontend, ManualClock>,
        LoopbackPeer,
    ) {
        let (transport, peer) = LoopbackTransport::pair();
        peer_setup(&peer);
        let client = ClientLoop::new(
            LoopConfig::default(),
            RecordingWorld::default(),
            transport,
            NullFrontend::default(),
            ManualClock::new(),
        );
        (client, peer)
    }

    #[test]
    fn authenticates_on_connect() {
        let (mut client, peer) = new_loop(|peer| peer.connect());
        client.iterate().unwrap();

        let sent = peer.take_sent();
        assert_eq!(sent.len(), 1);
        let (payload, reliable) = &sent[0];
        assert!(*reliable);

        let mut buf = ByteBuf::from_bytes(payload);
        assert_eq!(
            ClientMessage::decode(&mut buf).unwrap(),
            ClientMessage::Authenticate {
                protocol_version: PROTOCOL_VERSION
            }
        );
    }

    #[test]
    fn dispatches_messages_to_the_world() {
        let (mut client, peer) = new_loop(|peer| {
            peer.deliver(&ServerMessage::PlayerJoin { player_id: 4 });
            peer.deliver(&ServerMessage::PlayerMove {
                player_id: 4,
                position: Vec3::new(1.0, 2.0, 3.0),
                velocity: Vec3::ZERO,
                yaw: 0.0,
                pitch: 0.0,
            });
        });
        client.iterate().unwrap();

        let applied = &client.world().applied;
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0], ServerMessage::PlayerJoin { player_id: 4 });
        assert!(matches!(
            applied[1],
            ServerMessage::PlayerMove { player_id: 4, .. }
        ));
    }

    #[test]
    fn frameskip_bounds_ticks_per_iteration() {
        let (mut client, _peer) = new_loop(|_| {});
        client.iterate().unwrap();

        // A huge wall-clock jump still yields at most the cap.
        client.clock_mut().advance(30.0);
        client.iterate().unwrap();
        assert_eq!(client.world().ticks, DEFAULT_MAX_FRAMESKIP);

        client.clock_mut().advance(0.0);
        client.iterate().unwrap();
        assert_eq!(client.world().ticks, 2 * DEFAULT_MAX_FRAMESKIP);
    }

    #[test]
    fn interpolation_factor_stays_fractional_when_not_capped() {
        let (mut client, _peer) = new_loop(|_| {});
        client.iterate().unwrap();

        let dt = client.timestep().dt();
        client.clock_mut().advance(1.5 * dt);
        client.iterate().unwrap();

        assert_eq!(client.world().ticks, 1);
        let alpha = client.timestep().alpha();
        assert!((0.0..1.0).contains(&alpha));
    }

    #[test]
    fn moves_are_sent_unreliable_each_tick() {
        let (mut client, peer) = new_loop(|_| {});
        client.world_mut().report_moves = true;
        client.iterate().unwrap();

        let dt = client.timestep().dt();
        client.clock_mut().advance(2.0 * dt);
        client.iterate().unwrap();

        let sent = peer.take_sent();
        assert_eq!(sent.len(), 2);
        for (payload, reliable) in sent {
            assert!(!reliable);
            let mut buf = ByteBuf::from_bytes(&payload);
            assert!(matches!(
                ClientMessage::decode(&mut buf).unwrap(),
                ClientMessage::Move(_)
            ));
        }
    }

    #[test]
    fn deny_auth_is_a_clean_exit() {
        let (mut client, peer) = new_loop(|peer| {
            peer.connect();
            peer.deliver(&ServerMessage::DenyAuth { reason: 2 });
        });

        let reason = client.run().unwrap();
        assert_eq!(reason, ExitReason::AuthDenied);
        assert!(peer.is_closed());
        // The refusal never reaches the simulation layer.
        assert!(client.world().applied.is_empty());
    }

    #[test]
    fn unknown_opcode_is_fatal_and_closes_the_transport() {
        let (mut client, peer) = new_loop(|peer| {
            peer.deliver_raw(vec![0xFF, 0x01, 0x02]);
        });

        let err = client.run().unwrap_err();
        assert!(matches!(
            err,
            ClientError::Protocol(ProtocolError::UnknownOpcode(0xFF))
        ));
        assert!(peer.is_closed());
        assert!(client.world().applied.is_empty());
    }

    #[test]
    fn disconnect_stops_the_loop() {
        let (mut client, peer) = new_loop(|peer| {
            peer.connect();
            peer.disconnect();
        });

        let reason = client.run().unwrap();
        assert_eq!(reason, ExitReason::Disconnected);
        assert!(peer.is_closed());
    }

    #[test]
    fn close_request_stops_the_loop() {
        let (mut client, _peer) = new_loop(|_| {});
        client.frontend.close_after_frames = Some(3);

        let reason = client.run().unwrap();
        assert_eq!(reason, ExitReason::CloseRequested);
        assert_eq!(client.frontend.frames, 3);
    }
}
