//! parkspot - a terminal client for the parking reservation service.
//!
//! Builds the one `ApiClient` used for the whole run: base URL from the
//! environment, bearer token from the configured credential store, and a
//! logout policy for expired sessions.

mod cli;
mod commands;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parkspot_core::{
    ApiClient, CredentialStore, FileStore, KeyValueStore, KeyringStore, LogoutOnUnauthorized,
    MemoryStore,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, StoreKind};
use commands::CommandContext;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Open the selected backend, returning it with a human-readable location
fn open_store(kind: StoreKind) -> Result<(Arc<dyn KeyValueStore>, String)> {
    match kind {
        StoreKind::File => {
            let store =
                FileStore::default_location().context("Failed to locate credential file")?;
            let location = store.path().display().to_string();
            let store: Arc<dyn KeyValueStore> = Arc::new(store);
            Ok((store, location))
        }
        StoreKind::Keyring => {
            let store: Arc<dyn KeyValueStore> = Arc::new(KeyringStore::default());
            Ok((store, "OS keychain".to_string()))
        }
        StoreKind::Memory => {
            let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
            Ok((store, "memory".to_string()))
        }
    }
}

/// Shown instead of restarting when the server rejects the stored token
fn session_expired() {
    eprintln!("Session expired. Run `parkspot login` to sign in again.");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_tracing();

    let config = cli.client_config();
    let (backend, store_location) = open_store(cli.store)?;
    let credentials = CredentialStore::from_shared(backend);

    let logout = LogoutOnUnauthorized::new(credentials.clone()).with_reload(session_expired);
    let client = ApiClient::builder(config)
        .with_credentials(credentials.clone())
        .on_unauthorized(logout)
        .build()
        .context("Failed to build HTTP client")?;
    info!(base_url = client.base_url(), "parkspot starting");

    let ctx = CommandContext {
        client: &client,
        credentials: &credentials,
        store_location,
        json: cli.json,
    };
    commands::run(&ctx, cli.command).await
}
