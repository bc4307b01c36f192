//! Scripted server and its transport.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use archlink_client::{Connector, PacketHandler, Transport, TransportError, TransportEvent};
use archlink_proto::{
    ClientPacket, ConnectedPacket, DataPackageContents, GameData, LocationId, MalformedPacket,
    NetworkPlayer, RoomInfoPacket, ServerPacket, SlotId,
};
use parking_lot::Mutex;

use crate::fixtures::{network_item, player};

/// How the server answers a join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinPolicy {
    /// Accept every join.
    Accept,
    /// Refuse every join with these reasons.
    Refuse(Vec<String>),
    /// Accept only this password; refuse others with `InvalidPassword`.
    RequirePassword(String),
    /// Never answer.
    Ignore,
    /// Answer with an undecodable `Connected`.
    Garble,
}

struct Connection {
    handler: PacketHandler,
    connected: Arc<AtomicBool>,
}

struct State {
    policy: JoinPolicy,
    room: RoomInfoPacket,
    slot: SlotId,
    checked_locations: Vec<LocationId>,
    games: HashMap<String, GameData>,
    sent: Vec<Vec<ClientPacket>>,
    addresses: Vec<String>,
    current: Option<Connection>,
}

impl State {
    fn replies(&self, packets: &[ClientPacket]) -> Vec<TransportEvent> {
        packets
            .iter()
            .filter_map(|packet| match packet {
                ClientPacket::Connect { password, .. } => self.join_reply(password),
                ClientPacket::GetDataPackage { exclusions, .. } => {
                    Some(self.data_package(exclusions.as_deref().unwrap_or_default()))
                },
                _ => None,
            })
            .collect()
    }

    fn join_reply(&self, password: &str) -> Option<TransportEvent> {
        match &self.policy {
            JoinPolicy::Accept => Some(self.accepted()),
            JoinPolicy::RequirePassword(expected) if expected == password => Some(self.accepted()),
            JoinPolicy::RequirePassword(_) => Some(refused(vec!["InvalidPassword".to_string()])),
            JoinPolicy::Refuse(reasons) => Some(refused(reasons.clone())),
            JoinPolicy::Ignore => None,
            JoinPolicy::Garble => Some(TransportEvent::Malformed(MalformedPacket {
                cmd: "Connected".to_string(),
                reason: "missing field `slot`".to_string(),
            })),
        }
    }

    fn accepted(&self) -> TransportEvent {
        TransportEvent::Packet(ServerPacket::Connected(ConnectedPacket {
            team: 0,
            slot: self.slot,
            players: self.room.players.clone(),
            missing_locations: Vec::new(),
            checked_locations: self.checked_locations.clone(),
            slot_data: serde_json::json!({}),
        }))
    }

    fn data_package(&self, exclusions: &[String]) -> TransportEvent {
        let games = self
            .games
            .iter()
            .filter(|(name, _)| !exclusions.contains(name))
            .map(|(name, data)| (name.clone(), data.clone()))
            .collect();
        TransportEvent::Packet(ServerPacket::DataPackage { data: DataPackageContents { games } })
    }

    fn handler(&self) -> Option<PacketHandler> {
        self.current.as_ref().map(|connection| Arc::clone(&connection.handler))
    }
}

fn refused(reasons: Vec<String>) -> TransportEvent {
    TransportEvent::Packet(ServerPacket::ConnectionRefused { errors: reasons })
}

/// An in-process Archipelago server. Clones share state.
#[derive(Clone)]
pub struct ScriptedServer {
    state: Arc<Mutex<State>>,
}

impl Default for ScriptedServer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedServer {
    /// Server that accepts every join into slot 1 of a two-player room.
    pub fn new() -> Self {
        let room = RoomInfoPacket {
            players: vec![player(1, "alice"), player(2, "bob")],
            seed_name: "seed".to_string(),
            ..RoomInfoPacket::default()
        };
        Self {
            state: Arc::new(Mutex::new(State {
                policy: JoinPolicy::Accept,
                room,
                slot: SlotId(1),
                checked_locations: Vec::new(),
                games: HashMap::new(),
                sent: Vec::new(),
                addresses: Vec::new(),
                current: None,
            })),
        }
    }

    /// Set the join policy.
    #[must_use]
    pub fn with_policy(self, policy: JoinPolicy) -> Self {
        self.set_policy(policy);
        self
    }

    /// Set the room's players.
    #[must_use]
    pub fn with_players(self, players: Vec<NetworkPlayer>) -> Self {
        self.state.lock().room.players = players;
        self
    }

    /// Set the slot assigned on join.
    #[must_use]
    pub fn with_slot(self, slot: i32) -> Self {
        self.state.lock().slot = SlotId(slot);
        self
    }

    /// Add a game to the room, advertising its checksum.
    #[must_use]
    pub fn with_game(self, name: &str, data: GameData) -> Self {
        {
            let mut state = self.state.lock();
            state.room.games.push(name.to_string());
            state.room.datapackage_checksums.insert(name.to_string(), data.checksum.clone());
            state.games.insert(name.to_string(), data);
        }
        self
    }

    /// Change the join policy for later joins.
    pub fn set_policy(&self, policy: JoinPolicy) {
        self.state.lock().policy = policy;
    }

    /// Connector that opens transports to this server.
    pub fn connector(&self) -> Arc<ScriptedConnector> {
        Arc::new(ScriptedConnector { state: Arc::clone(&self.state) })
    }

    /// Deliver `packet` to the latest connection on the calling thread.
    ///
    /// Delivers even if that connection was closed, so tests can exercise
    /// late packets from a superseded transport.
    pub fn push(&self, packet: ServerPacket) {
        self.push_event(TransportEvent::Packet(packet));
    }

    /// Deliver a raw transport event to the latest connection.
    pub fn push_event(&self, event: TransportEvent) {
        let handler = self.state.lock().handler();
        if let Some(handler) = handler {
            handler(event);
        }
    }

    /// Deliver a `ReceivedItems` batch of bare item ids.
    pub fn push_items(&self, index: usize, items: &[i64]) {
        let items = items.iter().map(|id| network_item(*id)).collect();
        self.push(ServerPacket::ReceivedItems { index, items });
    }

    /// Close the latest connection from the server side.
    pub fn drop_connection(&self, reason: &str) {
        let handler = {
            let state = self.state.lock();
            state.current.as_ref().map(|connection| {
                connection.connected.store(false, Ordering::SeqCst);
                Arc::clone(&connection.handler)
            })
        };
        if let Some(handler) = handler {
            handler(TransportEvent::Closed { reason: reason.to_string() });
        }
    }

    /// Every batch the client sent, in order.
    pub fn sent(&self) -> Vec<Vec<ClientPacket>> {
        self.state.lock().sent.clone()
    }

    /// Every packet the client sent, flattened.
    pub fn sent_packets(&self) -> Vec<ClientPacket> {
        self.state.lock().sent.iter().flatten().cloned().collect()
    }

    /// Number of sent packets with this `cmd`.
    pub fn count_sent(&self, cmd: &str) -> usize {
        self.state.lock().sent.iter().flatten().filter(|p| p.cmd() == cmd).count()
    }

    /// Forget recorded batches.
    pub fn clear_sent(&self) {
        self.state.lock().sent.clear();
    }

    /// Number of transports opened.
    pub fn connection_count(&self) -> usize {
        self.state.lock().addresses.len()
    }

    /// Addresses transports were opened to, in order.
    pub fn addresses(&self) -> Vec<String> {
        self.state.lock().addresses.clone()
    }
}

/// Opens [`ScriptedTransport`]s to a [`ScriptedServer`].
pub struct ScriptedConnector {
    state: Arc<Mutex<State>>,
}

impl Connector for ScriptedConnector {
    fn open(
        &self,
        address: &str,
        handler: PacketHandler,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        let connected = Arc::new(AtomicBool::new(true));
        let room = {
            let mut state = self.state.lock();
            state.addresses.push(address.to_string());
            if let Some(previous) = state.current.take() {
                previous.connected.store(false, Ordering::SeqCst);
            }
            state.current =
                Some(Connection { handler: Arc::clone(&handler), connected: Arc::clone(&connected) });
            state.room.clone()
        };

        tracing::debug!(%address, "scripted connection opened");
        let alive = Arc::clone(&connected);
        thread::Builder::new()
            .name("scripted-server".to_string())
            .spawn(move || {
                if alive.load(Ordering::SeqCst) {
                    handler(TransportEvent::Packet(ServerPacket::RoomInfo(room)));
                }
            })
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(Arc::new(ScriptedTransport { state: Arc::clone(&self.state), connected }))
    }
}

/// One connection to a [`ScriptedServer`].
pub struct ScriptedTransport {
    state: Arc<Mutex<State>>,
    connected: Arc<AtomicBool>,
}

impl Transport for ScriptedTransport {
    fn send(&self, packets: Vec<ClientPacket>) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        let (handler, replies) = {
            let mut state = self.state.lock();
            let replies = state.replies(&packets);
            state.sent.push(packets);
            (state.handler(), replies)
        };

        if let Some(handler) = handler {
            for reply in replies {
                handler(reply);
            }
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}
