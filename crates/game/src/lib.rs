pub mod net;
pub mod simulation;

pub use net::{
    ByteBuf, ClientMessage, ClientOpcode, CodecError, Identifier, LoopbackPeer, LoopbackTransport,
    MoveUpdate, ProtocolError, ServerMessage, ServerOpcode, Transport, TransportEvent,
    TransportStats, UdpTransport, PROTOCOL_VERSION,
};
pub use simulation::{
    Buttons, ClientError, ClientLoop, Clock, ExitReason, FixedTimestep, Frontend, InputSample,
    LoopConfig, ManualClock, SystemClock, World, DEFAULT_MAX_FRAMESKIP, DEFAULT_TICK_RATE,
};
