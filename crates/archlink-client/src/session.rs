//! Session controller.
//!
//! Owns one logical session with a server: connection state, the received
//! item log, the metadata cache, and the pending scout result. Inbound
//! packets arrive on the transport thread and are dispatched here; caller
//! operations run on the caller's thread.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ connect ┌────────────┐  Connected   ┌───────────┐
//! │ Disconnected │────────>│ Connecting │─────────────>│ Connected │
//! └──────────────┘         └────────────┘              └───────────┘
//!        ^                       │ refused/timeout/            │ disconnect/
//!        │                       │ mismatch/closed             │ transport closed
//!        └───────────────────────┴─────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! - Each connect attempt has its own generation. Events from a transport
//!   opened by an earlier generation are ignored, as are handshake
//!   resolutions for it.
//! - The handshake is resolved at most once per generation.
//! - The received item log only grows by contiguous batches. Divergence
//!   discards it wholesale and asks the server to resend from scratch.
//! - Disconnect resets every session-scoped field but keeps the last-known
//!   credentials so `report_checked` can reconnect.
//!
//! # Locking
//!
//! `connect_lock` serializes connect attempts and is never taken on the
//! transport thread. `epoch` holds the current generation: dispatch checks it
//! and applies its effects under a read guard, and every reset bumps it under
//! the write guard, so a handler that passed the check cannot touch the next
//! session. Reads are recursive because a send may deliver replies on the
//! dispatching thread. Lock order is `epoch`, then `link`. `link` is held only
//! briefly and never across a send or a wait.

use std::{
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, AtomicI32, AtomicU8, AtomicUsize, Ordering},
    },
    time::Instant,
};

use archlink_core::{
    AppendOutcome, CacheStore, DataCache, HandshakeError, IdMapping, InstanceId, ItemLogHandle,
    LocationState, MemoryCacheStore, ReceivedItems, SessionIdentity,
};
use archlink_proto::{
    ClientPacket, ClientStatus, ConnectedPacket, DataPackageContents, ItemId, LocationId,
    MalformedPacket, NetworkItem, NetworkPlayer, RoomInfoPacket, RoomUpdatePacket, ServerPacket,
    SlotId,
};
use parking_lot::{Condvar, Mutex, RwLock};

use crate::{
    config::ClientConfig,
    error::SessionError,
    presenter::{Audience, LogSink, Presenter, TracingSink},
    result::{ConnectedInfo, ConnectionResult},
    transport::{Connector, PacketHandler, Transport, TransportEvent},
};

/// Caller-owned source of the locations this player has checked.
///
/// Must return `None` rather than block when it cannot answer yet. Called
/// from the transport thread.
pub type CheckedLocationsProvider<K> = Arc<dyn Fn() -> Option<Vec<K>> + Send + Sync>;

/// Sentinel for "no slot assigned".
const NO_SLOT: i32 = -1;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// No session. Initial state, and the state after any failure.
    Disconnected = 0,
    /// Transport opened, waiting for the server to accept or refuse.
    Connecting = 1,
    /// Server accepted the join request.
    Connected = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

/// Terminal handshake packet, as seen by the dispatch thread.
#[derive(Debug)]
enum HandshakeOutcome {
    Accepted(ConnectedPacket),
    Refused(Vec<String>),
    Unexpected(String),
    Closed(String),
}

#[derive(Debug, Default)]
struct HandshakeSlot {
    generation: u64,
    outcome: Option<HandshakeOutcome>,
}

/// Per-connection fields guarded together.
struct Link<K> {
    transport: Option<Arc<dyn Transport>>,
    identity: Option<SessionIdentity>,
    /// Survives disconnect; used to reconnect.
    last_identity: Option<SessionIdentity>,
    provider: Option<CheckedLocationsProvider<K>>,
    cached: Option<Arc<ConnectionResult>>,
}

impl<K> Default for Link<K> {
    fn default() -> Self {
        Self { transport: None, identity: None, last_identity: None, provider: None, cached: None }
    }
}

struct Inner<M: IdMapping> {
    config: ClientConfig,
    mapping: M,
    connector: Arc<dyn Connector>,
    store: Arc<dyn CacheStore>,
    presenter: Presenter,

    state: AtomicU8,
    slot: AtomicI32,
    player_count: AtomicUsize,
    /// Current connection generation.
    epoch: RwLock<u64>,
    resync_deferred: AtomicBool,
    scout_ready: AtomicBool,

    items: ItemLogHandle<M::Item>,
    cache: RwLock<DataCache>,
    scout: Mutex<Option<Vec<NetworkItem>>>,

    connect_lock: Mutex<()>,
    link: Mutex<Link<M::LocationKey>>,
    handshake: Mutex<HandshakeSlot>,
    handshake_cv: Condvar,
}

/// A session with an Archipelago server.
///
/// Cheap to clone; clones share the session.
pub struct Session<M: IdMapping> {
    inner: Arc<Inner<M>>,
}

impl<M: IdMapping> Clone for Session<M> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<M: IdMapping> Session<M> {
    /// Create a disconnected session.
    ///
    /// Uses an in-memory cache store and logs server messages through
    /// `tracing` until configured otherwise.
    pub fn new(config: ClientConfig, mapping: M, connector: Arc<dyn Connector>) -> Self {
        let store = Arc::new(MemoryCacheStore::new());
        Self::with_parts(config, mapping, connector, store, Arc::new(TracingSink))
    }

    /// Create a disconnected session with an explicit cache store and log sink.
    pub fn with_parts(
        config: ClientConfig,
        mapping: M,
        connector: Arc<dyn Connector>,
        store: Arc<dyn CacheStore>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        let presenter = Presenter::new(sink, config.large_session_threshold);
        Self {
            inner: Arc::new(Inner {
                config,
                mapping,
                connector,
                store,
                presenter,
                state: AtomicU8::new(ConnectionState::Disconnected as u8),
                slot: AtomicI32::new(NO_SLOT),
                player_count: AtomicUsize::new(0),
                epoch: RwLock::new(0),
                resync_deferred: AtomicBool::new(false),
                scout_ready: AtomicBool::new(false),
                items: ItemLogHandle::new(),
                cache: RwLock::new(DataCache::new()),
                scout: Mutex::new(None),
                connect_lock: Mutex::new(()),
                link: Mutex::new(Link::default()),
                handshake: Mutex::new(HandshakeSlot::default()),
                handshake_cv: Condvar::new(),
            }),
        }
    }

    /// Connect and join as `user`, blocking until the server answers or the
    /// configured timeout elapses.
    ///
    /// If already connected with the same server, user and password, returns
    /// the cached result without a new handshake. Any other existing session
    /// is torn down first. When `instance_id` is `None` the id of the previous
    /// attempt is reused, and one is generated on the first connect.
    pub fn connect(
        &self,
        server: &str,
        user: &str,
        password: &str,
        provider: CheckedLocationsProvider<M::LocationKey>,
        instance_id: Option<InstanceId>,
    ) -> Arc<ConnectionResult> {
        let _guard = self.inner.connect_lock.lock();
        let instance_id = instance_id
            .or_else(|| {
                let link = self.inner.link.lock();
                link.last_identity.as_ref().map(|last| last.instance_id.clone())
            })
            .unwrap_or_else(InstanceId::generate);
        let identity = SessionIdentity {
            server: server.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            instance_id,
        };
        self.inner.connect_locked(identity, provider)
    }

    /// Tear down the session. Last-known credentials are kept.
    pub fn disconnect(&self) {
        let _guard = self.inner.connect_lock.lock();
        let mut epoch = self.inner.epoch.write();
        let mut link = self.inner.link.lock();
        self.inner.reset(&mut epoch, &mut link);
    }

    /// Report every picked-up, non-external location as checked.
    ///
    /// Reconnects with the last-known credentials first if needed, and runs
    /// a deferred resync if one is pending. If that reconnect fails the
    /// failure is logged and the report is dropped for this cycle; nothing is
    /// queued. Fails with `NotConnected` only if no connect was ever made.
    pub fn report_checked(
        &self,
        locations: &[LocationState<M::LocationKey>],
    ) -> Result<(), SessionError> {
        let ids: Vec<LocationId> = locations
            .iter()
            .filter(|location| location.is_reportable())
            .map(|location| self.inner.mapping.location_id(&location.key))
            .collect();

        if !self.reconnect_if_needed()? {
            return Ok(());
        }
        self.retry_deferred_resync();
        self.inner.send(vec![ClientPacket::LocationChecks { locations: ids }])
    }

    /// Re-run a resync that was skipped because the checked-locations
    /// provider could not answer. Returns true if a resync was sent.
    pub fn retry_deferred_resync(&self) -> bool {
        let _epoch = self.inner.epoch.read_recursive();
        if !self.inner.resync_deferred.load(Ordering::Acquire) || !self.is_connected() {
            return false;
        }
        self.inner.resync()
    }

    /// True if a resync is waiting for the provider.
    pub fn has_deferred_resync(&self) -> bool {
        self.inner.resync_deferred.load(Ordering::Acquire)
    }

    /// The item following 1-based `current_index`, if received.
    pub fn next_item(&self, current_index: usize) -> Option<M::Item> {
        self.inner.items.current().next_after(current_index)
    }

    /// The current received item log.
    pub fn received_items(&self) -> Arc<ReceivedItems<M::Item>> {
        self.inner.items.current()
    }

    /// Send a status update.
    pub fn set_status(&self, status: ClientStatus) -> Result<(), SessionError> {
        self.inner.send(vec![ClientPacket::StatusUpdate { status }])
    }

    /// Send a chat message.
    pub fn say(&self, text: &str) -> Result<(), SessionError> {
        self.inner.send(vec![ClientPacket::Say { text: text.to_string() }])
    }

    /// Request data package tables for every game except `exclusions`.
    pub fn request_game_data(&self, exclusions: Vec<String>) -> Result<(), SessionError> {
        let request = ClientPacket::GetDataPackage { games: None, exclusions: Some(exclusions) };
        self.inner.send(vec![request])
    }

    /// Ask what sits at `locations`. The answer arrives asynchronously; poll
    /// [`Session::take_scout_result`].
    pub fn scout_locations(&self, locations: Vec<LocationId>) -> Result<(), SessionError> {
        self.inner.scout_ready.store(false, Ordering::Release);
        self.inner.send(vec![ClientPacket::LocationScouts { locations, create_as_hint: 0 }])
    }

    /// True if a scout answer is waiting.
    pub fn has_scout_result(&self) -> bool {
        self.inner.scout_ready.load(Ordering::Acquire)
    }

    /// Take the latest scout answer, if one is ready.
    pub fn take_scout_result(&self) -> Option<Vec<NetworkItem>> {
        if !self.inner.scout_ready.swap(false, Ordering::AcqRel) {
            return None;
        }
        self.inner.scout.lock().take()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    /// True if connected and the transport is up.
    pub fn is_connected(&self) -> bool {
        self.inner.is_connected(&self.inner.link.lock())
    }

    /// Slot assigned by the server.
    pub fn slot(&self) -> Option<SlotId> {
        self.inner.slot()
    }

    /// Number of players in the room when we joined.
    pub fn player_count(&self) -> usize {
        self.inner.player_count.load(Ordering::Acquire)
    }

    /// Result of the latest connect attempt of the current session.
    pub fn last_result(&self) -> Option<Arc<ConnectionResult>> {
        self.inner.link.lock().cached.clone()
    }

    /// Display name of `slot`, or its number.
    pub fn player_name(&self, slot: SlotId) -> String {
        self.inner.cache.read().player_name(slot)
    }

    /// Name of `item`, or its id.
    pub fn item_name(&self, item: ItemId) -> String {
        self.inner.cache.read().item_name(item)
    }

    /// Name of `location`, or its id.
    pub fn location_name(&self, location: LocationId) -> String {
        self.inner.cache.read().location_name(location)
    }

    /// Ok(false) if a reconnect was attempted and failed.
    fn reconnect_if_needed(&self) -> Result<bool, SessionError> {
        let _guard = self.inner.connect_lock.lock();
        let (identity, provider) = {
            let link = self.inner.link.lock();
            if self.inner.is_connected(&link) {
                return Ok(true);
            }
            match (link.last_identity.clone(), link.provider.clone()) {
                (Some(identity), Some(provider)) => (identity, provider),
                _ => return Err(SessionError::NotConnected),
            }
        };

        tracing::info!(server = %identity.server, "reconnecting");
        match &*self.inner.connect_locked(identity, provider) {
            ConnectionResult::Connected(_) => Ok(true),
            ConnectionResult::Failed(err) if err.is_transient() => {
                tracing::warn!(error = %err, "reconnect failed, dropping report");
                Ok(false)
            },
            ConnectionResult::Failed(err) => {
                tracing::error!(error = %err, "server rejected reconnect, dropping report");
                Ok(false)
            },
        }
    }
}

impl<M: IdMapping> Inner<M> {
    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn slot(&self) -> Option<SlotId> {
        match self.slot.load(Ordering::Acquire) {
            NO_SLOT => None,
            slot => Some(SlotId(slot)),
        }
    }

    fn is_connected(&self, link: &Link<M::LocationKey>) -> bool {
        self.state() == ConnectionState::Connected
            && link.transport.as_ref().is_some_and(|transport| transport.is_connected())
    }

    fn connect_locked(
        self: &Arc<Self>,
        identity: SessionIdentity,
        provider: CheckedLocationsProvider<M::LocationKey>,
    ) -> Arc<ConnectionResult> {
        let mut epoch = self.epoch.write();
        let mut link = self.link.lock();

        if self.is_connected(&link) {
            let same = link.identity.as_ref().is_some_and(|current| {
                current.same_credentials(&identity.server, &identity.user, &identity.password)
            });
            if let (true, Some(cached)) = (same, link.cached.as_ref()) {
                tracing::debug!(server = %identity.server, "already connected");
                return Arc::clone(cached);
            }
        }

        self.reset(&mut epoch, &mut link);

        *epoch += 1;
        let generation = *epoch;
        *self.handshake.lock() = HandshakeSlot { generation, outcome: None };
        self.set_state(ConnectionState::Connecting);
        self.load_cache();

        link.identity = Some(identity.clone());
        link.last_identity = Some(identity.clone());
        link.provider = Some(provider);

        tracing::info!(server = %identity.server, user = %identity.user, generation, "connecting");
        match self.connector.open(&identity.server, self.handler(generation)) {
            Ok(transport) => link.transport = Some(transport),
            Err(e) => {
                self.reset(&mut epoch, &mut link);
                let failed = ConnectionResult::Failed(HandshakeError::Transport(e.to_string()));
                return self.finish(&mut link, failed);
            },
        }
        drop(link);
        drop(epoch);

        let outcome = self.wait_for_handshake(generation);

        let mut epoch = self.epoch.write();
        let mut link = self.link.lock();
        let result = match outcome {
            Some(HandshakeOutcome::Accepted(packet)) => {
                self.player_count.store(packet.players.len(), Ordering::Release);
                self.set_state(ConnectionState::Connected);
                tracing::info!(slot = %packet.slot, players = packet.players.len(), "connected");
                ConnectionResult::Connected(ConnectedInfo::new(packet, identity.instance_id))
            },
            Some(HandshakeOutcome::Refused(reasons)) => {
                tracing::warn!(?reasons, "connection refused");
                self.reset(&mut epoch, &mut link);
                ConnectionResult::Failed(HandshakeError::Refused { reasons })
            },
            Some(HandshakeOutcome::Unexpected(cmd)) => {
                tracing::warn!(%cmd, "unexpected handshake packet");
                self.reset(&mut epoch, &mut link);
                ConnectionResult::Failed(HandshakeError::ProtocolMismatch)
            },
            Some(HandshakeOutcome::Closed(reason)) => {
                self.reset(&mut epoch, &mut link);
                ConnectionResult::Failed(HandshakeError::Transport(reason))
            },
            None => {
                tracing::warn!(timeout = ?self.config.connection_timeout, "connection timed out");
                self.reset(&mut epoch, &mut link);
                let elapsed = self.config.connection_timeout;
                ConnectionResult::Failed(HandshakeError::Timeout { elapsed })
            },
        };
        self.finish(&mut link, result)
    }

    fn finish(
        &self,
        link: &mut Link<M::LocationKey>,
        result: ConnectionResult,
    ) -> Arc<ConnectionResult> {
        let result = Arc::new(result);
        link.cached = Some(Arc::clone(&result));
        result
    }

    fn wait_for_handshake(&self, generation: u64) -> Option<HandshakeOutcome> {
        let deadline = Instant::now() + self.config.connection_timeout;
        let mut slot = self.handshake.lock();
        while slot.generation == generation && slot.outcome.is_none() {
            if self.handshake_cv.wait_until(&mut slot, deadline).timed_out() {
                break;
            }
        }
        if slot.generation == generation { slot.outcome.take() } else { None }
    }

    fn resolve(&self, generation: u64, outcome: HandshakeOutcome) {
        let mut slot = self.handshake.lock();
        if slot.generation != generation || slot.outcome.is_some() {
            tracing::debug!(generation, "ignoring late handshake resolution");
            return;
        }
        slot.outcome = Some(outcome);
        self.handshake_cv.notify_all();
    }

    /// Reset every session-scoped field and close the transport.
    ///
    /// Called with the epoch's write guard, so no handler of the ending
    /// generation is still running.
    fn reset(&self, epoch: &mut u64, link: &mut Link<M::LocationKey>) {
        *epoch += 1;
        if let Some(transport) = link.transport.take() {
            transport.close();
        }
        link.identity = None;
        link.cached = None;

        self.set_state(ConnectionState::Disconnected);
        self.slot.store(NO_SLOT, Ordering::Release);
        self.player_count.store(0, Ordering::Release);
        self.resync_deferred.store(false, Ordering::Release);
        self.scout_ready.store(false, Ordering::Release);
        *self.scout.lock() = None;
        *self.cache.write() = DataCache::new();
        self.items.replace();
    }

    fn load_cache(&self) {
        match self.store.load() {
            Ok(games) => self.cache.write().load_games(games),
            Err(e) => tracing::warn!(error = %e, "could not load data package cache"),
        }
    }

    fn send(&self, packets: Vec<ClientPacket>) -> Result<(), SessionError> {
        let transport = self.link.lock().transport.clone().ok_or(SessionError::NotConnected)?;
        transport.send(packets)?;
        Ok(())
    }

    fn handler(self: &Arc<Self>, generation: u64) -> PacketHandler {
        let weak: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_event(generation, event);
            }
        })
    }

    fn on_event(&self, generation: u64, event: TransportEvent) {
        let epoch = self.epoch.read_recursive();
        if *epoch != generation {
            tracing::trace!(generation, "ignoring event from stale transport");
            return;
        }

        match event {
            TransportEvent::Packet(packet) => self.dispatch(generation, packet),
            TransportEvent::Malformed(malformed) => self.on_malformed(generation, &malformed),
            TransportEvent::Closed { reason } => {
                drop(epoch);
                self.on_closed(generation, reason);
            },
        }
    }

    fn dispatch(&self, generation: u64, packet: ServerPacket) {
        match packet {
            ServerPacket::RoomInfo(info) => self.on_room_info(&info),
            ServerPacket::RoomUpdate(update) => self.on_room_update(&update),
            ServerPacket::DataPackage { data } => self.on_data_package(&data),
            ServerPacket::ConnectionRefused { errors } => {
                self.resolve(generation, HandshakeOutcome::Refused(errors));
            },
            ServerPacket::Connected(packet) => self.on_connected(generation, packet),
            ServerPacket::LocationInfo { locations } => self.on_location_info(locations),
            ServerPacket::ReceivedItems { index, items } => self.on_received_items(index, &items),
            ServerPacket::Print { text } => {
                if let Some(text) = text {
                    self.presenter.print(&text);
                }
            },
            ServerPacket::PrintJson { data, .. } => {
                let audience = Audience {
                    slot: self.slot(),
                    player_count: self.player_count.load(Ordering::Acquire),
                };
                self.presenter.print_json(&data, audience, &self.cache.read());
            },
            ServerPacket::Unknown => tracing::trace!("ignoring unknown packet"),
        }
    }

    fn on_room_info(&self, info: &RoomInfoPacket) {
        let request = {
            let mut cache = self.cache.write();
            cache.update_players(&info.players);
            cache.validate(&info.datapackage_checksums)
        };

        let Some(identity) = self.link.lock().identity.clone() else {
            tracing::debug!("room info without a pending connect");
            return;
        };

        let mut packets = Vec::with_capacity(2);
        if let Some(request) = request {
            tracing::debug!(stale = ?request.stale, "requesting data package");
            packets.push(request.into_packet());
        }
        packets.push(self.join_request(&identity));

        if let Err(e) = self.send(packets) {
            tracing::warn!(error = %e, "could not send join request");
        }
    }

    fn join_request(&self, identity: &SessionIdentity) -> ClientPacket {
        ClientPacket::Connect {
            password: identity.password.clone(),
            game: self.config.game.clone(),
            name: identity.user.clone(),
            uuid: identity.instance_id.to_string(),
            version: self.config.client_version,
            items_handling: self.config.items_handling,
            tags: self.config.tags.clone(),
            slot_data: self.config.request_slot_data,
        }
    }

    fn on_room_update(&self, update: &RoomUpdatePacket) {
        if let Some(players) = &update.players {
            self.update_players(players);
        }
    }

    fn update_players(&self, players: &[NetworkPlayer]) {
        self.cache.write().update_players(players);
    }

    fn on_connected(&self, generation: u64, packet: ConnectedPacket) {
        self.slot.store(packet.slot.0, Ordering::Release);
        self.update_players(&packet.players);
        self.resolve(generation, HandshakeOutcome::Accepted(packet));
    }

    fn on_data_package(&self, data: &DataPackageContents) {
        let games = {
            let mut cache = self.cache.write();
            cache.merge(&data.games);
            cache.games().clone()
        };

        if let Err(e) = self.store.save(&games) {
            tracing::warn!(error = %e, "could not save data package cache");
        }
    }

    fn on_location_info(&self, locations: Vec<NetworkItem>) {
        *self.scout.lock() = Some(locations);
        self.scout_ready.store(true, Ordering::Release);
    }

    fn on_received_items(&self, index: usize, items: &[NetworkItem]) {
        let mapped = items.iter().map(|item| self.mapping.item(item)).collect();
        match self.items.current().append_batch(index, mapped) {
            AppendOutcome::Appended { count, len } => {
                tracing::debug!(index, count, len, "received items");
            },
            AppendOutcome::Diverged { expected, received } => {
                tracing::warn!(expected, received, "received item index diverged, resynchronizing");
                self.resync();
            },
        }
    }

    /// Discard the item log and ask the server to resend it.
    ///
    /// Does nothing, and marks the resync deferred, if the provider cannot
    /// answer yet.
    fn resync(&self) -> bool {
        let provider = self.link.lock().provider.clone();
        let Some(checked) = provider.and_then(|provider| provider()) else {
            tracing::debug!("checked locations unavailable, deferring resync");
            self.resync_deferred.store(true, Ordering::Release);
            return false;
        };

        self.resync_deferred.store(false, Ordering::Release);
        self.items.replace();

        let locations = checked.iter().map(|key| self.mapping.location_id(key)).collect();
        let packets = vec![ClientPacket::Sync, ClientPacket::LocationChecks { locations }];
        if let Err(e) = self.send(packets) {
            tracing::warn!(error = %e, "could not send resync");
        }
        true
    }

    fn on_malformed(&self, generation: u64, malformed: &MalformedPacket) {
        if matches!(malformed.cmd.as_str(), "Connected" | "ConnectionRefused") {
            self.resolve(generation, HandshakeOutcome::Unexpected(malformed.cmd.clone()));
        } else {
            tracing::debug!(
                cmd = %malformed.cmd,
                reason = %malformed.reason,
                "ignoring malformed packet"
            );
        }
    }

    fn on_closed(&self, generation: u64, reason: String) {
        let mut epoch = self.epoch.write();
        if *epoch != generation {
            return;
        }
        if self.state() == ConnectionState::Connecting {
            drop(epoch);
            self.resolve(generation, HandshakeOutcome::Closed(reason));
            return;
        }

        tracing::info!(%reason, "connection lost");
        let mut link = self.link.lock();
        self.reset(&mut epoch, &mut link);
    }
}
