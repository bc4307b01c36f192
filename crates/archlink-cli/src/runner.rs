//! Command execution and background update polling.

use std::{
    collections::BTreeSet,
    io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use archlink_client::{CheckedLocationsProvider, LogLine, LogSink, Session, SessionError};
use archlink_core::{LocationState, RawIds};
use archlink_proto::{LocationId, NetworkItem};
use crossbeam_channel::{Receiver, select, tick};
use parking_lot::Mutex;
use thiserror::Error;

use crate::command::Command;

/// How often the watcher polls for new items and scout answers.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors that end the CLI.
#[derive(Error, Debug)]
pub enum CliError {
    /// Initial connect failed.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Session operation failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Terminal I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Whether to keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Exit.
    Quit,
}

/// Locations checked during this run. Clones share the record.
///
/// Answers the session's checked-locations queries, so a resync resends
/// everything reported so far.
#[derive(Debug, Clone, Default)]
pub struct CheckedLog {
    ids: Arc<Mutex<BTreeSet<LocationId>>>,
}

impl CheckedLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every location recorded, in id order.
    pub fn ids(&self) -> Vec<LocationId> {
        self.ids.lock().iter().copied().collect()
    }

    /// Provider for `Session::connect`.
    pub fn provider(&self) -> CheckedLocationsProvider<LocationId> {
        let log = self.clone();
        Arc::new(move || Some(log.ids()))
    }

    fn record(&self, ids: &[LocationId]) {
        self.ids.lock().extend(ids.iter().copied());
    }
}

/// Run one command against the session.
pub fn execute(
    session: &Session<RawIds>,
    checked: &CheckedLog,
    sink: &dyn LogSink,
    command: Command,
) -> Result<Flow, SessionError> {
    match command {
        Command::Check(ids) => {
            checked.record(&ids);
            let locations: Vec<_> = checked
                .ids()
                .into_iter()
                .map(|id| LocationState { key: id, picked_up: true, external: false })
                .collect();
            session.report_checked(&locations)?;
            let text = if session.is_connected() {
                format!("Reported {} location(s)", locations.len())
            } else {
                "Server unreachable, report dropped".to_string()
            };
            sink.add(LogLine::Plain(text));
        },
        Command::Status(status) => session.set_status(status)?,
        Command::Scout(ids) => session.scout_locations(ids)?,
        Command::Items => {
            let items = session.received_items().snapshot();
            if items.is_empty() {
                sink.add(LogLine::Plain("No items received".to_string()));
            }
            for (offset, item) in items.iter().enumerate() {
                sink.add(item_line(session, offset + 1, item));
            }
        },
        Command::Quit => return Ok(Flow::Quit),
        Command::Say(text) => session.say(&text)?,
    }
    Ok(Flow::Continue)
}

/// Position of the last item announced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateCursor {
    /// 1-based index of the last announced item.
    pub announced: usize,
}

/// Announce items received since `cursor` and any ready scout answer.
///
/// A resync rebuilds the log with the same items, so the cursor is kept and
/// resent items are not announced twice.
pub fn poll_updates(session: &Session<RawIds>, sink: &dyn LogSink, cursor: &mut UpdateCursor) {
    while let Some(item) = session.next_item(cursor.announced) {
        cursor.announced += 1;
        sink.add(item_line(session, cursor.announced, &item));
    }

    if let Some(scouted) = session.take_scout_result() {
        for item in scouted {
            sink.add(LogLine::Plain(format!(
                "{} holds {} for {}",
                session.location_name(item.location),
                session.item_name(item.item),
                session.player_name(item.player),
            )));
        }
    }
}

/// Poll for updates on a background thread until `stop` fires or closes.
pub fn spawn_watcher(
    session: Session<RawIds>,
    sink: Arc<dyn LogSink>,
    stop: Receiver<()>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name("archlink-watch".to_string()).spawn(move || {
        let ticker = tick(POLL_INTERVAL);
        let mut cursor = UpdateCursor::default();
        loop {
            select! {
                recv(stop) -> _ => break,
                recv(ticker) -> _ => poll_updates(&session, sink.as_ref(), &mut cursor),
            }
        }
        tracing::debug!(announced = cursor.announced, "watcher stopped");
    })
}

fn item_line(session: &Session<RawIds>, position: usize, item: &NetworkItem) -> LogLine {
    LogLine::Plain(format!(
        "#{position} {} from {} ({})",
        session.item_name(item.item),
        session.player_name(item.player),
        session.location_name(item.location),
    ))
}
