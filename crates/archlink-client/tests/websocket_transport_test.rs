//! WebSocket transport against a loopback tungstenite server.

use std::{
    net::TcpListener,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use archlink_client::{Connector, PacketHandler, TransportError, TransportEvent, WebSocketConnector};
use archlink_proto::{ClientPacket, ServerPacket};
use crossbeam_channel::Receiver;
use tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

fn collect_events() -> (PacketHandler, Receiver<TransportEvent>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let handler: PacketHandler = Arc::new(move |event: TransportEvent| {
        let _ = tx.send(event);
    });
    (handler, rx)
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn exchanges_frames_and_reports_server_close() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut socket = tungstenite::accept(stream).unwrap();
        socket
            .send(Message::text(
                r#"[{"cmd":"RoomInfo","players":[],"games":[],"datapackage_checksums":{}}]"#,
            ))
            .unwrap();

        let received = loop {
            match socket.read().unwrap() {
                Message::Text(text) => break text,
                _ => continue,
            }
        };
        socket.close(None).unwrap();
        while socket.read().is_ok() {}
        received
    });

    let (handler, events) = collect_events();
    let transport = WebSocketConnector.open(&format!("127.0.0.1:{port}"), handler).unwrap();

    let first = events.recv_timeout(WAIT).unwrap();
    assert!(matches!(first, TransportEvent::Packet(ServerPacket::RoomInfo(_))));
    assert!(wait_until(|| transport.is_connected()));

    transport.send(vec![ClientPacket::Sync]).unwrap();

    let received = server.join().unwrap();
    assert_eq!(received.to_string(), r#"[{"cmd":"Sync"}]"#);

    let closed = loop {
        match events.recv_timeout(WAIT) {
            Ok(TransportEvent::Closed { reason }) => break reason,
            Ok(_) => continue,
            Err(e) => panic!("no close event: {e}"),
        }
    };
    assert!(closed.contains("closed by server"), "{closed}");
    assert!(wait_until(|| !transport.is_connected()));
}

#[test]
fn unreachable_server_reports_close() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let (handler, events) = collect_events();
    let transport = WebSocketConnector.open(&format!("ws://127.0.0.1:{port}"), handler).unwrap();

    assert!(matches!(events.recv_timeout(WAIT), Ok(TransportEvent::Closed { .. })));
    assert!(!transport.is_connected());
}

#[test]
fn local_close_is_not_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut socket = tungstenite::accept(stream).unwrap();
        while socket.read().is_ok() {}
    });

    let (handler, events) = collect_events();
    let transport = WebSocketConnector.open(&format!("127.0.0.1:{port}"), handler).unwrap();
    assert!(wait_until(|| transport.is_connected()));

    transport.close();

    assert!(matches!(transport.send(vec![ClientPacket::Sync]), Err(TransportError::Closed)));
    server.join().unwrap();
    assert!(wait_until(|| !transport.is_connected()));
    assert!(events.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn invalid_address_fails_before_connecting() {
    let (handler, _events) = collect_events();

    let result = WebSocketConnector.open("http://127.0.0.1:1", handler);

    assert!(matches!(result, Err(TransportError::InvalidAddress(_))));
}
