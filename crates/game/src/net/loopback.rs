//! In-memory transport for tests and demos: a queue pair with a peer handle
//! standing in for the remote authority. Delivery is ordered and lossless.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use super::buffer::ByteBuf;
use super::protocol::ServerMessage;
use super::transport::{Transport, TransportEvent};

type EventQueue = Rc<RefCell<VecDeque<TransportEvent>>>;
type SentQueue = Rc<RefCell<VecDeque<(Vec<u8>, bool)>>>;

pub struct LoopbackTransport {
    inbound: EventQueue,
    outbound: SentQueue,
    closed: Rc<Cell<bool>>,
}

/// The authority's end: pushes events toward the client and inspects what the
/// client sent.
pub struct LoopbackPeer {
    inbound: EventQueue,
    outbound: SentQueue,
    closed: Rc<Cell<bool>>,
}

impl LoopbackTransport {
    pub fn pair() -> (LoopbackTransport, LoopbackPeer) {
        let inbound: EventQueue = Rc::default();
        let outbound: SentQueue = Rc::default();
        let closed = Rc::new(Cell::new(false));

        let transport = LoopbackTransport {
            inbound: Rc::clone(&inbound),
            outbound: Rc::clone(&outbound),
            closed: Rc::clone(&closed),
        };
        let peer = LoopbackPeer {
            inbound,
            outbound,
            closed,
        };
        (transport, peer)
    }
}

impl Transport for LoopbackTransport {
    fn poll(&mut self) -> io::Result<Vec<TransportEvent>> {
        Ok(self.inbound.borrow_mut().drain(..).collect())
    }

    fn send(&mut self, payload: &[u8], reliable: bool) -> io::Result<()> {
        if self.closed.get() {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport closed",
            ));
        }
        self.outbound
            .borrow_mut()
            .push_back((payload.to_vec(), reliable));
        Ok(())
    }

    fn close(&mut self) {
        self.closed.set(true);
    }
}

impl LoopbackPeer {
    pub fn connect(&self) {
        self.inbound
            .borrow_mut()
            .push_back(TransportEvent::Connected);
    }

    pub fn disconnect(&self) {
        self.inbound
            .borrow_mut()
            .push_back(TransportEvent::Disconnected);
    }

    pub fn deliver_raw(&self, payload: Vec<u8>) {
        self.inbound
            .borrow_mut()
            .push_back(TransportEvent::Message(payload));
    }

    pub fn deliver(&self, message: &ServerMessage) {
        let mut buf = ByteBuf::new();
        message.encode(&mut buf);
        self.deliver_raw(buf.as_slice().to_vec());
    }

    /// Everything the client sent since the last call, oldest first, paired
    /// with its reliability flag.
    pub fn take_sent(&self) -> Vec<(Vec<u8>, bool)> {
        self.outbound.borrow_mut().drain(..).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_order() {
        let (mut transport, peer) = LoopbackTransport::pair();
        peer.connect();
        peer.deliver_raw(vec![1]);
        peer.deliver_raw(vec![2]);

        let events = transport.poll().unwrap();
        assert_eq!(
            events,
            vec![
                TransportEvent::Connected,
                TransportEvent::Message(vec![1]),
                TransportEvent::Message(vec![2]),
            ]
        );
        assert!(transport.poll().unwrap().is_empty());
    }

    #[test]
    fn close_is_visible_to_the_peer() {
        let (mut transport, peer) = LoopbackTransport::pair();
        transport.send(&[5], true).unwrap();
        transport.close();

        assert!(peer.is_closed());
        assert_eq!(peer.take_sent(), vec![(vec![5], true)]);
        assert!(transport.send(&[6], false).is_err());
    }
}
