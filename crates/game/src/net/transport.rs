//! Transport seam between the client loop and whatever carries its bytes.
//!
//! The loop only needs an ordered stream of opaque payloads plus connect and
//! disconnect notifications; everything else about the carrier (handshakes,
//! retransmission, encryption) stays on the far side of this trait.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

/// Delivered by [`Transport::poll`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    Message(Vec<u8>),
}

pub trait Transport {
    /// Drains everything the carrier has ready. Must not block beyond a
    /// bounded poll; the simulation phase runs right after this.
    fn poll(&mut self) -> io::Result<Vec<TransportEvent>>;

    /// Sends one payload. `reliable` asks the carrier for guaranteed
    /// delivery where it can provide it; adapters without a reliability
    /// layer send best-effort either way.
    fn send(&mut self, payload: &[u8], reliable: bool) -> io::Result<()>;

    /// Orderly shutdown. Safe to call more than once.
    fn close(&mut self);
}

pub const FRAME_MAGIC: u32 = 0x5354_5241;
pub const MAX_DATAGRAM_SIZE: usize = 1200;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const FRAME_HEADER_SIZE: usize = 8;
const SEQUENCE_WRAP_THRESHOLD: u32 = u32::MAX / 2;

#[inline]
pub fn sequence_newer(s1: u32, s2: u32) -> bool {
    ((s1 > s2) && (s1 - s2 <= SEQUENCE_WRAP_THRESHOLD))
        || ((s1 < s2) && (s2 - s1 > SEQUENCE_WRAP_THRESHOLD))
}

#[derive(Debug, Clone, Default)]
pub struct TransportStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub packets_dropped: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Datagram adapter: non-blocking socket, a magic + sequence frame header so
/// foreign traffic and stale datagrams are dropped before they reach the
/// dispatcher. Delivered payloads are therefore in order, though unreliable —
/// this adapter has no retransmission, so the `reliable` flag is best-effort.
pub struct UdpTransport {
    socket: UdpSocket,
    remote: SocketAddr,
    send_sequence: u32,
    last_received: Option<u32>,
    recv_buffer: [u8; MAX_DATAGRAM_SIZE],
    stats: TransportStats,
    timeout: Duration,
    last_receive_time: Instant,
    connect_pending: bool,
    open: bool,
}

impl UdpTransport {
    /// Binds an ephemeral local port and aims at `remote`. The `Connected`
    /// notification is raised on the first poll; session establishment beyond
    /// that is the protocol's authenticate exchange.
    pub fn connect<A: ToSocketAddrs>(remote: A) -> io::Result<Self> {
        let remote = remote
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no address resolved"))?;
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        socket.connect(remote)?;

        Ok(Self {
            socket,
            remote,
            send_sequence: 0,
            last_received: None,
            recv_buffer: [0u8; MAX_DATAGRAM_SIZE],
            stats: TransportStats::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            last_receive_time: Instant::now(),
            connect_pending: true,
            open: true,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    pub fn stats(&self) -> &TransportStats {
        &self.stats
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn accept_sequence(&mut self, sequence: u32) -> bool {
        match self.last_received {
            Some(last) if !sequence_newer(sequence, last) => false,
            _ => {
                self.last_received = Some(sequence);
                true
            }
        }
    }
}

impl Transport for UdpTransport {
    fn poll(&mut self) -> io::Result<Vec<TransportEvent>> {
        let mut events = Vec::new();
        if !self.open {
            return Ok(events);
        }

        if self.connect_pending {
            self.connect_pending = false;
            self.last_receive_time = Instant::now();
            events.push(TransportEvent::Connected);
        }

        loop {
            match self.socket.recv(&mut self.recv_buffer) {
                Ok(size) => {
                    if size < FRAME_HEADER_SIZE {
                        self.stats.packets_dropped += 1;
                        continue;
                    }

                    let magic = u32::from_le_bytes([
                        self.recv_buffer[0],
                        self.recv_buffer[1],
                        self.recv_buffer[2],
                        self.recv_buffer[3],
                    ]);
                    if magic != FRAME_MAGIC {
                        self.stats.packets_dropped += 1;
                        continue;
                    }

                    let sequence = u32::from_le_bytes([
                        self.recv_buffer[4],
                        self.recv_buffer[5],
                        self.recv_buffer[6],
                        self.recv_buffer[7],
                    ]);
                    if !self.accept_sequence(sequence) {
                        log::debug!("dropping stale datagram {sequence}");
                        self.stats.packets_dropped += 1;
                        continue;
                    }

                    self.stats.packets_received += 1;
                    self.stats.bytes_received += size as u64;
                    self.last_receive_time = Instant::now();

                    events.push(TransportEvent::Message(
                        self.recv_buffer[FRAME_HEADER_SIZE..size].to_vec(),
                    ));
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }

        if self.last_receive_time.elapsed() > self.timeout {
            log::warn!("connection to {} timed out", self.remote);
            self.open = false;
            events.push(TransportEvent::Disconnected);
        }

        Ok(events)
    }

    fn send(&mut self, payload: &[u8], _reliable: bool) -> io::Result<()> {
        if !self.open {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport closed",
            ));
        }
        if payload.len() > MAX_DATAGRAM_SIZE - FRAME_HEADER_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "payload exceeds MTU",
            ));
        }

        let sequence = self.send_sequence;
        self.send_sequence = self.send_sequence.wrapping_add(1);

        let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
        frame.extend_from_slice(&FRAME_MAGIC.to_le_bytes());
        frame.extend_from_slice(&sequence.to_le_bytes());
        frame.extend_from_slice(payload);

        let bytes = self.socket.send(&frame)?;
        self.stats.packets_sent += 1;
        self.stats.bytes_sent += bytes as u64;

        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            log::info!("closing transport to {}", self.remote);
            self.open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_comparison_wraps() {
        assert!(sequence_newer(2, 1));
        assert!(!sequence_newer(1, 2));
        assert!(sequence_newer(0, u32::MAX));
        assert!(!sequence_newer(u32::MAX, 0));
        assert!(!sequence_newer(5, 5));
    }
}
