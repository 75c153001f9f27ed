//! nicval server binary.
//!
//! Loads [`ServerConfig`] from `config.toml` (or `--config`) and `NICVAL_*`
//! environment variables, opens the SQLite record store and serves the JSON
//! API. `--hash-password` prints the argon2 string for `auth_password_hash`
//! instead.

use std::{io::BufRead, path::PathBuf, sync::Arc};

use anyhow::{Context as _, anyhow};
use clap::Parser;
use nicval_server::{AppState, ServerConfig, auth};
use nicval_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "NIC validation server")]
struct Cli {
  /// TOML configuration file; NICVAL_* variables override its keys.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Read a password from stdin, print its argon2 hash and exit.
  #[arg(long)]
  hash_password: bool,
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
  if cli.hash_password {
    return print_hash();
  }

  let config = ServerConfig::load(&cli.config)
    .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

  let store_path = config.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("opening record store {}", store_path.display()))?;

  let state = AppState {
    store: Arc::new(store),
    auth:  Arc::new(auth::AuthConfig::from(&config)),
  };

  let address = config.address();
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("binding {address}"))?;

  tracing::info!(
    %address,
    user = %config.auth_username,
    store = %store_path.display(),
    "serving nicval API"
  );
  axum::serve(listener, nicval_server::router(state))
    .await
    .context("server error")
}

fn print_hash() -> anyhow::Result<()> {
  eprint!("Password: ");
  let mut line = String::new();
  std::io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']);
  if password.is_empty() {
    return Err(anyhow!("empty password"));
  }

  let hash = auth::hash_password(password).map_err(|e| anyhow!("argon2 error: {e}"))?;
  println!("{hash}");
  Ok(())
}
