//! Non-blocking TCP transport for the connection manager.
//!
//! The listener and every accepted stream stay in non-blocking mode so a
//! tick never waits on the network.  Writes are the exception: a response is
//! written in blocking mode, bounded by the configured write timeout.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use crate::error::{OnvifError, Result};
use crate::server::{Connection, Listener};

const READ_CHUNK: usize = 1024;

pub struct TcpTransport {
    listener:      TcpListener,
    write_timeout: Duration,
}

impl TcpTransport {
    /// Bind the listener.  Writes must stay bounded, so a zero
    /// `write_timeout` is refused.
    pub fn bind(addr: &str, port: u16, write_timeout: Duration) -> Result<Self> {
        if write_timeout.is_zero() {
            return Err(OnvifError::Config("write timeout must be non-zero".into()));
        }
        let listener = TcpListener::bind((addr, port))?;
        listener.set_nonblocking(true)?;
        Ok(Self { listener, write_timeout })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

impl Listener for TcpTransport {
    type Conn = TcpConnection;

    fn accept_if_pending(&mut self) -> io::Result<Option<TcpConnection>> {
        let (stream, peer) = match self.listener.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(e),
        };
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(self.write_timeout))?;
        Ok(Some(TcpConnection { stream, peer }))
    }
}

pub struct TcpConnection {
    stream: TcpStream,
    peer:   SocketAddr,
}

impl Connection for TcpConnection {
    fn is_connected(&mut self) -> bool {
        // A peek of zero bytes means the peer's FIN has arrived.
        let mut byte = [0u8; 1];
        match self.stream.peek(&mut byte) {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) => matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted),
        }
    }

    fn read_available(&mut self) -> io::Result<Vec<u8>> {
        let mut data = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => data.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(data)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.set_nonblocking(false)?;
        let written = self.stream.write_all(data).and_then(|()| self.stream.flush());
        self.stream.set_nonblocking(true)?;
        written
    }

    fn peer(&self) -> String {
        self.peer.to_string()
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::camera::StaticCamera;
    use crate::config::ResponderConfig;
    use crate::onvif::Responder;
    use crate::server::ConnectionManager;

    const MAX_TICKS: usize = 400;

    fn manager() -> (ConnectionManager<TcpTransport>, SocketAddr) {
        let transport =
            TcpTransport::bind("127.0.0.1", 0, Duration::from_secs(2)).unwrap();
        let addr = transport.local_addr().unwrap();
        let cfg = Arc::new(ResponderConfig {
            advertise_host: "127.0.0.1".into(),
            ..ResponderConfig::default()
        });
        let camera = Box::new(StaticCamera::from_config(&cfg));
        (ConnectionManager::new(transport, Responder::new(cfg, camera)), addr)
    }

    fn tick_until(
        mgr: &mut ConnectionManager<TcpTransport>,
        mut done: impl FnMut(&ConnectionManager<TcpTransport>) -> bool,
    ) {
        for _ in 0..MAX_TICKS {
            mgr.tick();
            if done(mgr) {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("condition not reached after {MAX_TICKS} ticks");
    }

    #[test]
    fn loopback_request_response_and_disconnect() {
        let (mut mgr, addr) = manager();
        let mut client = TcpStream::connect(addr).unwrap();
        tick_until(&mut mgr, |m| m.live_connection_count() == 1);

        client
            .write_all(
                b"POST /onvif/media_service HTTP/1.1\r\n\
                  SOAPAction: \"urn:Media/GetStreamUri\"\r\n\
                  \r\n\
                  <s:Envelope><s:Body/></s:Envelope>",
            )
            .unwrap();
        client.set_read_timeout(Some(Duration::from_millis(5))).unwrap();

        let mut response = Vec::new();
        let mut buf = [0u8; 4096];
        for _ in 0..MAX_TICKS {
            mgr.tick();
            match client.read(&mut buf) {
                Ok(n) => response.extend_from_slice(&buf[..n]),
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(e) => panic!("client read failed: {e}"),
            }
            if response.ends_with(b"</soap:Envelope>") {
                break;
            }
        }
        let text = String::from_utf8(response).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("<tt:Uri>rtsp://127.0.0.1:554/mjpeg/1</tt:Uri>"));

        drop(client);
        tick_until(&mut mgr, |m| m.live_connection_count() == 0);
    }

    #[test]
    fn zero_write_timeout_is_refused() {
        assert!(TcpTransport::bind("127.0.0.1", 0, Duration::ZERO).is_err());
    }

    #[test]
    fn idle_listener_accepts_nothing() {
        let (mut mgr, _) = manager();
        mgr.tick();
        assert_eq!(mgr.live_connection_count(), 0);
    }
}
