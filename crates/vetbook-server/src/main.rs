//! vetbook server binary.
//!
//! Reads `config.toml` (or the path given with `--config`, with `VETBOOK_*`
//! environment overrides), opens the two SQLite stores, and serves the
//! clinic API over HTTP until SIGINT/SIGTERM.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vetbook_server::{AppState, ServerConfig};
use vetbook_store_sqlite::{SqliteDocumentStore, SqliteRelationalStore};

#[derive(Parser)]
#[command(author, version, about = "Veterinary clinic backend")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("VETBOOK"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // The two stores are opened independently and never share a transaction.
  let rel = SqliteRelationalStore::open(&server_cfg.relational_db)
    .await
    .with_context(|| {
      format!("failed to open relational store at {:?}", server_cfg.relational_db)
    })?;
  let doc = SqliteDocumentStore::open(&server_cfg.documents_db)
    .await
    .with_context(|| {
      format!("failed to open document store at {:?}", server_cfg.documents_db)
    })?;

  let cipher = vetbook_cipher::FieldCipher::new(&server_cfg.field_secret);

  let state = AppState {
    rel:    Arc::new(rel.clone()),
    doc:    Arc::new(doc.clone()),
    cipher: Arc::new(cipher),
    config: Arc::new(server_cfg.clone()),
  };

  let app = vetbook_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  // Stores close after the server has drained.
  tracing::info!("shutting down");
  rel.close().await.context("closing relational store")?;
  doc.close().await.context("closing document store")?;

  Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to install ctrl-c handler");
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => tracing::error!(error = %e, "failed to install SIGTERM handler"),
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    () = ctrl_c => {},
    () = terminate => {},
  }
}
