//! Connection manager: multiplexes every open client over one thread.
//!
//! Each `tick()` accepts at most one pending connection, then gives every
//! live connection exactly one chance to be serviced, in accept order.
//! Nothing here blocks waiting for data; a connection with nothing to read
//! is skipped until the next tick.

use std::io;

use log::{debug, info, warn};

use crate::onvif::request::{parse_request, Parsed};
use crate::onvif::soap::serialize_as_http;
use crate::onvif::Responder;

/// One accepted byte stream to a remote peer.
pub trait Connection {
    /// Whether the peer is still there.  Asked of the transport on every call.
    fn is_connected(&mut self) -> bool;

    /// Every byte readable right now, without waiting.  Empty when nothing
    /// has arrived yet.
    fn read_available(&mut self) -> io::Result<Vec<u8>>;

    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Human-readable peer identity for logs.
    fn peer(&self) -> String;

    fn close(&mut self) {}
}

/// Source of new connections.
pub trait Listener {
    type Conn: Connection;

    /// A pending connection if one is waiting, without blocking.
    fn accept_if_pending(&mut self) -> io::Result<Option<Self::Conn>>;
}

struct Client<C> {
    conn:   C,
    closed: bool,
}

pub struct ConnectionManager<L: Listener> {
    listener:  L,
    responder: Responder,
    clients:   Vec<Client<L::Conn>>,
}

impl<L: Listener> ConnectionManager<L> {
    pub fn new(listener: L, responder: Responder) -> Self {
        Self {
            listener,
            responder,
            clients: Vec::new(),
        }
    }

    /// Run one scheduling round.  Transport failures are confined to the
    /// connection they happen on.
    pub fn tick(&mut self) {
        match self.listener.accept_if_pending() {
            Ok(Some(conn)) => {
                info!("ONVIF client connected: {}", conn.peer());
                self.clients.push(Client { conn, closed: false });
            }
            Ok(None) => {}
            Err(e) => warn!("ONVIF accept failed: {e}"),
        }

        for client in &mut self.clients {
            if !client.conn.is_connected() {
                info!("ONVIF client disconnected: {}", client.conn.peer());
                client.closed = true;
                continue;
            }
            if let Err(e) = service_one(&self.responder, &mut client.conn) {
                warn!("ONVIF client {}: {e}; dropping connection", client.conn.peer());
                client.conn.close();
                client.closed = true;
            }
        }

        self.clients.retain(|c| !c.closed);
    }

    pub fn live_connection_count(&self) -> usize {
        self.clients.len()
    }

    /// Close and forget every live connection.
    pub fn shutdown(&mut self) {
        for client in &mut self.clients {
            client.conn.close();
        }
        self.clients.clear();
    }
}

/// Answer at most one request on `conn`.
fn service_one<C: Connection>(responder: &Responder, conn: &mut C) -> io::Result<()> {
    let bytes = conn.read_available()?;
    match parse_request(&bytes) {
        Parsed::Empty => Ok(()),
        Parsed::Ignored(line) => {
            debug!("ignoring non-POST request from {}: {line}", conn.peer());
            Ok(())
        }
        Parsed::Request(req) => {
            let document = responder.handle(&req);
            conn.write_all(serialize_as_http(&document).as_bytes())
        }
    }
}
