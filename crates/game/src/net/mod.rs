mod buffer;
mod loopback;
mod protocol;
mod transport;

pub use buffer::{ByteBuf, CodecError};
pub use loopback::{LoopbackPeer, LoopbackTransport};
pub use protocol::{
    ClientMessage, ClientOpcode, Identifier, MoveUpdate, ProtocolError, ServerMessage,
    ServerOpcode, PROTOCOL_VERSION,
};
pub use transport::{
    sequence_newer, Transport, TransportEvent, TransportStats, UdpTransport, DEFAULT_TIMEOUT_SECS,
    FRAME_MAGIC, MAX_DATAGRAM_SIZE,
};
