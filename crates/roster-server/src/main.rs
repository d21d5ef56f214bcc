//! roster-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), overlays
//! `ROSTER_*` environment variables, opens an in-process SQLite store, and
//! serves the Roster JSON API over HTTP.
//!
//! ```text
//! ROSTER_PORT=9000 cargo run -p roster-server -- --config roster.toml
//! ```

mod settings;

use std::{future::Future, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use roster_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Roster enrollment server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the resolved configuration and exit.
  #[arg(long)]
  check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  if cli.check_config {
    println!("{}", serde_json::to_string_pretty(&server_cfg)?);
    return Ok(());
  }

  if let Some(parent) = server_cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?
    .with_enrollment_mode(server_cfg.class_enrollment_mode);
  tracing::info!(
    store = %server_cfg.store_path.display(),
    class_enrollment_mode = %store.enrollment_mode(),
    "store ready"
  );

  let app = roster_api::api_router(Arc::new(store)).layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
    .await
    .context("server error")?;

  Ok(())
}

/// Resolve once `signal` fires. If the signal cannot be installed the server
/// keeps running rather than stopping at once.
async fn shutdown_on(signal: impl Future<Output = std::io::Result<()>>) {
  if let Err(e) = signal.await {
    tracing::warn!(error = %e, "cannot listen for ctrl-c; graceful shutdown disabled");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}
