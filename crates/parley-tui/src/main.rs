//! Parley terminal client.
//!
//! # Usage
//!
//! ```bash
//! # Authenticated relay with room-scoped joins
//! parley --auth-url https://chat.example.com --relay-url wss://chat.example.com
//!
//! # Anonymous relay, log to a file
//! parley --relay-url ws://localhost:8000 --anonymous --log-file parley.log
//! ```

use std::{fs::File, path::PathBuf, sync::Mutex, time::Duration};

use clap::Parser;
use parley_app::{Runtime, Session, SessionConfig};
use parley_client::{FileCredentialStore, default_credential_path, http::HttpAuthClient};
use parley_core::{Endpoint, Variant};
use parley_tui::TerminalDriver;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Parley chat client
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Terminal client for Parley chat relays")]
#[command(version)]
struct Args {
    /// Base URL of the auth service
    #[arg(long, default_value = "http://localhost:8000")]
    auth_url: String,

    /// Base URL of the relay (ws:// or wss://)
    #[arg(long, default_value = "ws://localhost:8000")]
    relay_url: String,

    /// Use the anonymous relay: no login, one global room
    #[arg(long)]
    anonymous: bool,

    /// Credential file (defaults to the user config directory)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Give up on a connection that has not opened after this many seconds
    #[arg(long)]
    connect_timeout_secs: Option<u64>,

    /// Abandon a login or signup request after this many seconds
    #[arg(long, default_value_t = 10)]
    auth_timeout_secs: u64,

    /// Write logs here. The terminal belongs to the UI, so without this
    /// nothing is logged.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
        let file = File::create(path)?;

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
            .with(filter)
            .init();
    }

    let variant = if args.anonymous { Variant::Anonymous } else { Variant::RoomScoped };
    let endpoint = Endpoint::parse(&args.relay_url, variant)?;
    let config = SessionConfig::new(endpoint)
        .with_connect_timeout(args.connect_timeout_secs.map(Duration::from_secs));

    let store_path = args
        .store
        .or_else(default_credential_path)
        .ok_or("no config directory; pass --store to choose a credential file")?;
    let store = FileCredentialStore::open(store_path);

    tracing::info!(relay = %args.relay_url, auth = %args.auth_url, ?variant, "parley starting");

    let session = Session::new(config, store);
    let auth = HttpAuthClient::new(args.auth_url)
        .with_timeout(Duration::from_secs(args.auth_timeout_secs));
    let driver = TerminalDriver::new(auth)?;

    Ok(Runtime::new(driver, session).run().await?)
}
