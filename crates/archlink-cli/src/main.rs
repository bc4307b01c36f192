//! Archipelago command-line client.
//!
//! # Usage
//!
//! ```bash
//! # Connect to a local server
//! archlink --server localhost:38281 --name Player1
//!
//! # Keep the data package cache between runs
//! archlink --server wss://archipelago.gg:38281 --name Player1 --persist-cache
//! ```

use std::{
    io::{self, BufRead},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use archlink_cli::{CheckedLog, CliError, Console, Flow, execute, parse, spawn_watcher};
use archlink_client::{
    ClientConfig, ConnectionResult, LogLine, LogSink, Session, WebSocketConnector,
};
use archlink_core::{CacheStore, InstanceId, JsonFileCacheStore, MemoryCacheStore, RawIds};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Archipelago client
#[derive(Parser, Debug)]
#[command(name = "archlink")]
#[command(about = "Command-line client for Archipelago multiworld servers")]
#[command(version)]
struct Args {
    /// Server address (host:port, ws:// or wss:// URL)
    #[arg(short, long)]
    server: String,

    /// Slot name to join as
    #[arg(short, long)]
    name: String,

    /// Room password
    #[arg(short, long, default_value = "")]
    password: String,

    /// Instance id to reconnect as; generated if omitted
    #[arg(long)]
    uuid: Option<String>,

    /// Game the slot was generated for
    #[arg(long, default_value = archlink_client::config::DEFAULT_GAME)]
    game: String,

    /// Data package cache file
    #[arg(long, conflicts_with = "persist_cache")]
    cache: Option<PathBuf>,

    /// Keep the data package cache in the platform cache directory
    #[arg(long)]
    persist_cache: bool,

    /// Handshake timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    Ok(run(args)?)
}

fn run(args: Args) -> Result<(), CliError> {
    let console: Arc<dyn LogSink> = Arc::new(Console::stdout());
    let config = ClientConfig {
        game: args.game,
        connection_timeout: Duration::from_secs(args.timeout),
        ..ClientConfig::default()
    };
    let store = cache_store(args.cache, args.persist_cache);
    let session = Session::with_parts(
        config,
        RawIds,
        Arc::new(WebSocketConnector),
        store,
        Arc::clone(&console),
    );

    let checked = CheckedLog::new();
    let result = session.connect(
        &args.server,
        &args.name,
        &args.password,
        checked.provider(),
        args.uuid.map(InstanceId::new),
    );
    let info = match &*result {
        ConnectionResult::Connected(info) => info,
        ConnectionResult::Failed(err) => return Err(CliError::Connect(err.to_string())),
    };
    console.add(LogLine::Plain(format!(
        "Connected as {} (slot {}, instance {})",
        session.player_name(info.slot),
        info.slot,
        info.instance_id,
    )));

    let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
    let watcher = spawn_watcher(session.clone(), Arc::clone(&console), stop_rx)?;

    for line in io::stdin().lock().lines() {
        let command = match parse(&line?) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                console.add(LogLine::Plain(e.to_string()));
                continue;
            },
        };

        match execute(&session, &checked, console.as_ref(), command) {
            Ok(Flow::Continue) => {},
            Ok(Flow::Quit) => break,
            Err(e) => console.add(LogLine::Plain(format!("error: {e}"))),
        }
    }

    drop(stop_tx);
    if watcher.join().is_err() {
        tracing::warn!("watcher thread panicked");
    }
    session.disconnect();
    Ok(())
}

fn cache_store(path: Option<PathBuf>, persist: bool) -> Arc<dyn CacheStore> {
    let path = path.or_else(|| {
        persist.then(dirs::cache_dir).flatten().map(|dir| JsonFileCacheStore::default_path(&dir))
    });
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "using data package cache file");
            Arc::new(JsonFileCacheStore::new(path))
        },
        None => {
            if persist {
                tracing::warn!("no platform cache directory, keeping cache in memory");
            }
            Arc::new(MemoryCacheStore::new())
        },
    }
}
