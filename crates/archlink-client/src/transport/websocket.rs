//! WebSocket transport.
//!
//! One thread per connection owns the socket. It connects, then alternates
//! between draining the outbound queue and reading with a short timeout, so
//! sends never wait on a blocked read. `wss://` addresses use rustls with
//! the webpki root store.

use std::{
    io::ErrorKind,
    net::TcpStream,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use archlink_proto::{ClientPacket, InboundPacket, decode_frame, encode_frame};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tungstenite::{Message, WebSocket, stream::MaybeTlsStream};

use super::{Connector, PacketHandler, Transport, TransportError, TransportEvent};

/// Read timeout; bounds how long a queued send waits for the socket thread.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Turn a user-supplied server address into a WebSocket URL.
///
/// Bare `host:port` addresses get `ws://`. `ws://` and `wss://` URLs pass
/// through unchanged.
pub fn normalize_address(address: &str) -> Result<String, TransportError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(TransportError::InvalidAddress("empty address".to_string()));
    }

    match address.split_once("://") {
        None => Ok(format!("ws://{address}")),
        Some(("ws" | "wss", rest)) if !rest.is_empty() => Ok(address.to_string()),
        Some((scheme, _)) => {
            Err(TransportError::InvalidAddress(format!("unsupported scheme '{scheme}'")))
        },
    }
}

/// Opens [`WebSocketTransport`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    fn open(
        &self,
        address: &str,
        handler: PacketHandler,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        let url = normalize_address(address)?;
        let (outbound_tx, outbound_rx) = crossbeam_channel::unbounded();
        let shared = Arc::new(Shared::default());

        let worker = Worker { url, outbound: outbound_rx, shared: Arc::clone(&shared), handler };
        thread::Builder::new()
            .name("archlink-ws".to_string())
            .spawn(move || worker.run())
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(Arc::new(WebSocketTransport { outbound: outbound_tx, shared }))
    }
}

#[derive(Default)]
struct Shared {
    connected: AtomicBool,
    closing: AtomicBool,
}

/// Handle to a WebSocket connection thread.
pub struct WebSocketTransport {
    outbound: Sender<Vec<ClientPacket>>,
    shared: Arc<Shared>,
}

impl Transport for WebSocketTransport {
    fn send(&self, packets: Vec<ClientPacket>) -> Result<(), TransportError> {
        if self.shared.closing.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.outbound.send(packets).map_err(|_| TransportError::Closed)
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.shared.closing.store(true, Ordering::Release);
    }
}

struct Worker {
    url: String,
    outbound: Receiver<Vec<ClientPacket>>,
    shared: Arc<Shared>,
    handler: PacketHandler,
}

impl Worker {
    fn run(self) {
        let reason = match self.connect() {
            Ok(mut socket) => {
                self.shared.connected.store(true, Ordering::Release);
                tracing::info!(url = %self.url, "websocket connected");
                let reason = self.pump(&mut socket);
                self.shared.connected.store(false, Ordering::Release);
                let _ = socket.close(None);
                let _ = socket.flush();
                reason
            },
            Err(reason) => reason,
        };

        if self.shared.closing.load(Ordering::Acquire) {
            tracing::debug!(url = %self.url, "websocket closed locally");
        } else {
            tracing::warn!(url = %self.url, %reason, "websocket closed");
            (self.handler)(TransportEvent::Closed { reason });
        }
    }

    fn connect(&self) -> Result<Socket, String> {
        if self.url.starts_with("wss://") {
            // Err means a provider is already installed.
            let _ = rustls::crypto::ring::default_provider().install_default();
        }
        let (socket, _response) =
            tungstenite::connect(self.url.as_str()).map_err(|e| e.to_string())?;
        set_poll_timeout(&socket).map_err(|e| e.to_string())?;
        Ok(socket)
    }

    /// Runs until the connection ends, returning why.
    fn pump(&self, socket: &mut Socket) -> String {
        loop {
            if self.shared.closing.load(Ordering::Acquire) {
                return "closed by client".to_string();
            }

            if let Err(reason) = self.flush_outbound(socket) {
                return reason;
            }

            match socket.read() {
                Ok(Message::Text(text)) => self.deliver(&text),
                Ok(Message::Close(frame)) => {
                    return frame.map_or_else(
                        || "closed by server".to_string(),
                        |f| format!("closed by server: {}", f.reason),
                    );
                },
                Ok(_) => {},
                Err(tungstenite::Error::Io(e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {},
                Err(e) => return e.to_string(),
            }
        }
    }

    fn flush_outbound(&self, socket: &mut Socket) -> Result<(), String> {
        loop {
            let packets = match self.outbound.try_recv() {
                Ok(packets) => packets,
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => return Err("transport dropped".to_string()),
            };

            let text = match encode_frame(&packets) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping unencodable packets");
                    continue;
                },
            };
            socket.send(Message::text(text)).map_err(|e| e.to_string())?;
        }
    }

    fn deliver(&self, text: &str) {
        let packets = match decode_frame(text) {
            Ok(packets) => packets,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring undecodable frame");
                return;
            },
        };

        for packet in packets {
            let event = match packet {
                InboundPacket::Packet(packet) => TransportEvent::Packet(packet),
                InboundPacket::Malformed(malformed) => TransportEvent::Malformed(malformed),
            };
            (self.handler)(event);
        }
    }
}

fn set_poll_timeout(socket: &Socket) -> std::io::Result<()> {
    match socket.get_ref() {
        MaybeTlsStream::Plain(stream) => stream.set_read_timeout(Some(POLL_INTERVAL)),
        MaybeTlsStream::Rustls(stream) => stream.get_ref().set_read_timeout(Some(POLL_INTERVAL)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_address_gets_ws_scheme() {
        assert_eq!(normalize_address("localhost:38281").unwrap(), "ws://localhost:38281");
        assert_eq!(normalize_address(" archipelago.gg:1234 ").unwrap(), "ws://archipelago.gg:1234");
    }

    #[test]
    fn websocket_urls_pass_through() {
        let url = "wss://archipelago.gg:1234";
        assert_eq!(normalize_address(url).unwrap(), url);
        assert_eq!(normalize_address("ws://127.0.0.1:1").unwrap(), "ws://127.0.0.1:1");
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert!(matches!(normalize_address("http://h:1"), Err(TransportError::InvalidAddress(_))));
        assert!(matches!(normalize_address("ws://"), Err(TransportError::InvalidAddress(_))));
        assert!(matches!(normalize_address(""), Err(TransportError::InvalidAddress(_))));
    }
}
