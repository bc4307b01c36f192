//! Caller-side operations: location reports, status, chat, scouting, and
//! server message presentation.

use std::{sync::Arc, time::Duration};

use archlink_client::{
    ClientConfig, Color, ConnectionState, LogLine, Segment, Session, SessionError,
};
use archlink_core::{HandshakeError, LocationState, MemoryCacheStore};
use archlink_harness::{
    CheckedLocations, JoinPolicy, OffsetMapping, RecordingSink, ScriptedServer, network_item,
    player,
};
use archlink_proto::{
    ClientPacket, ClientStatus, JsonMessagePart, LocationId, ServerPacket, SlotId,
};

struct Fixture {
    server: ScriptedServer,
    sink: RecordingSink,
    session: Session<OffsetMapping>,
}

impl Fixture {
    fn new(server: ScriptedServer) -> Self {
        let sink = RecordingSink::new();
        let config =
            ClientConfig { connection_timeout: Duration::from_secs(2), ..ClientConfig::default() };
        let session = Session::with_parts(
            config,
            OffsetMapping,
            server.connector(),
            Arc::new(MemoryCacheStore::new()),
            Arc::new(sink.clone()),
        );
        Self { server, sink, session }
    }

    fn connected(server: ScriptedServer) -> Self {
        let fixture = Self::new(server);
        let provider = CheckedLocations::answering(vec![]).provider();
        let result = fixture.session.connect("localhost", "alice", "", provider, None);
        assert!(result.is_connected(), "{:?}", result.reason());
        fixture.server.clear_sent();
        fixture
    }
}

fn picked(key: u32) -> LocationState<u32> {
    LocationState { key, picked_up: true, external: false }
}

#[test]
fn report_sends_only_picked_up_local_locations() {
    let f = Fixture::connected(ScriptedServer::new());
    let locations = [
        picked(1),
        LocationState { key: 2, picked_up: false, external: false },
        LocationState { key: 3, picked_up: true, external: true },
        picked(4),
    ];

    f.session.report_checked(&locations).unwrap();

    assert_eq!(f.server.sent_packets(), vec![ClientPacket::LocationChecks {
        locations: vec![OffsetMapping::id(1), OffsetMapping::id(4)],
    }]);
}

#[test]
fn report_before_any_connect_is_not_connected() {
    let f = Fixture::new(ScriptedServer::new());

    let result = f.session.report_checked(&[picked(1)]);

    assert!(matches!(result, Err(SessionError::NotConnected)));
    assert_eq!(f.server.connection_count(), 0);
}

#[test]
fn report_reconnects_after_connection_loss() {
    let f = Fixture::connected(ScriptedServer::new());
    f.server.drop_connection("server restarted");
    assert_eq!(f.session.state(), ConnectionState::Disconnected);

    f.session.report_checked(&[picked(7)]).unwrap();

    assert!(f.session.is_connected());
    assert_eq!(f.server.connection_count(), 2);
    let cmds: Vec<_> = f.server.sent_packets().iter().map(ClientPacket::cmd).collect();
    assert_eq!(cmds, vec!["Connect", "LocationChecks"]);
}

#[test]
fn failed_reconnect_drops_the_report() {
    let f = Fixture::connected(ScriptedServer::new());
    f.server.drop_connection("server restarted");
    f.server.set_policy(JoinPolicy::Refuse(vec!["InvalidSlot".into()]));

    let result = f.session.report_checked(&[picked(7)]);

    assert_eq!(result, Ok(()));
    assert_eq!(f.server.connection_count(), 2);
    assert_eq!(f.server.count_sent("LocationChecks"), 0);
    assert_eq!(f.session.state(), ConnectionState::Disconnected);
    let last = f.session.last_result().unwrap();
    let Some(HandshakeError::Refused { reasons }) = last.error() else {
        panic!("expected refused reconnect, got {last:?}");
    };
    assert_eq!(reasons, &vec!["InvalidSlot".to_string()]);
}

#[test]
fn status_and_chat_are_forwarded() {
    let f = Fixture::connected(ScriptedServer::new());

    f.session.set_status(ClientStatus::Goal).unwrap();
    f.session.say("hello").unwrap();
    f.session.request_game_data(vec!["Archipelago".into()]).unwrap();

    assert_eq!(f.server.sent(), vec![
        vec![ClientPacket::StatusUpdate { status: ClientStatus::Goal }],
        vec![ClientPacket::Say { text: "hello".into() }],
        vec![ClientPacket::GetDataPackage {
            games: None,
            exclusions: Some(vec!["Archipelago".into()])
        }],
    ]);
}

#[test]
fn sending_while_disconnected_fails() {
    let f = Fixture::new(ScriptedServer::new());
    assert!(matches!(f.session.say("hello"), Err(SessionError::NotConnected)));

    let f = Fixture::connected(ScriptedServer::new());
    f.session.disconnect();
    assert!(matches!(f.session.say("hello"), Err(SessionError::NotConnected)));
    assert!(f.server.sent().is_empty());
}

#[test]
fn scout_result_is_taken_once() {
    let f = Fixture::connected(ScriptedServer::new());
    f.session.scout_locations(vec![LocationId(1001)]).unwrap();
    assert!(!f.session.has_scout_result());

    f.server.push(ServerPacket::LocationInfo { locations: vec![network_item(55)] });

    assert!(f.session.has_scout_result());
    assert_eq!(f.session.take_scout_result(), Some(vec![network_item(55)]));
    assert_eq!(f.session.take_scout_result(), None);
}

#[test]
fn new_scout_hides_previous_answer() {
    let f = Fixture::connected(ScriptedServer::new());
    f.server.push(ServerPacket::LocationInfo { locations: vec![network_item(1)] });

    f.session.scout_locations(vec![LocationId(1002)]).unwrap();

    assert!(!f.session.has_scout_result());
    assert_eq!(f.session.take_scout_result(), None);
}

#[test]
fn print_splits_lines() {
    let f = Fixture::connected(ScriptedServer::new());

    f.server.push(ServerPacket::Print { text: Some("first\nsecond".into()) });

    assert_eq!(f.sink.lines(), vec![
        LogLine::Plain("first".into()),
        LogLine::Plain("second".into()),
    ]);
}

#[test]
fn print_json_resolves_names_and_colors() {
    let f = Fixture::connected(ScriptedServer::new());

    f.server.push(ServerPacket::PrintJson {
        data: vec![
            JsonMessagePart::typed("player_id", "1"),
            JsonMessagePart::text(" sent to "),
            JsonMessagePart::typed("player_id", "2"),
        ],
        kind: Some("ItemSend".into()),
    });

    assert_eq!(f.sink.lines(), vec![LogLine::Segments(vec![
        Segment::new("alice", Color::Yellow),
        Segment::new(" sent to ", Color::White),
        Segment::new("bob", Color::Orange),
    ])]);
}

/// INVARIANT: Large rooms only show rich-text messages that mention us.
#[test]
fn large_rooms_filter_unrelated_broadcasts() {
    let players = (1..=25).map(|slot| player(slot, &format!("p{slot}"))).collect();
    let f = Fixture::connected(ScriptedServer::new().with_players(players));
    assert_eq!(f.session.player_count(), 25);
    assert_eq!(f.session.slot(), Some(SlotId(1)));

    f.server.push(ServerPacket::PrintJson {
        data: vec![JsonMessagePart::typed("player_id", "7"), JsonMessagePart::text(" found it")],
        kind: None,
    });
    f.server.push(ServerPacket::PrintJson {
        data: vec![JsonMessagePart::typed("player_id", "1"), JsonMessagePart::text(" found it")],
        kind: None,
    });
    f.server.push(ServerPacket::Print { text: Some("plain text is never filtered".into()) });

    assert_eq!(f.sink.texts(), vec!["p1 found it", "plain text is never filtered"]);
}
