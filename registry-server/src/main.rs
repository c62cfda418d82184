//! Registry API server.
//!
//! Usage:
//!   registry-server --config registry.toml --port 6543
//!
//! Without `--config` the built-in settings are used: one `assets` resource
//! stored in `registry.sqlite`.

use anyhow::{Context, Result};
use clap::Parser;
use registry_server::{build_router, AppState, Settings};
use registry_storage::SqliteStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "registry-server")]
#[command(about = "Registry API server")]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the settings file
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let mut listen: SocketAddr = settings
        .listen
        .parse()
        .with_context(|| format!("invalid listen address {}", settings.listen))?;
    if let Some(port) = args.port {
        listen.set_port(port);
    }

    let store = SqliteStore::open(&settings.database.path, &settings.database.name)
        .with_context(|| format!("opening {}", settings.database.path.display()))?;
    let state = AppState::new(settings, Arc::new(store)).context("building application state")?;
    let prefix = state.settings.route_prefix();
    let app = build_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    info!("Registry API listening on http://{}{}", listen, prefix);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
