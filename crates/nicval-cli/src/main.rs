//! `nicval`: decode, extract and batch-validate identity-card numbers, look
//! them up against the external validation service, and browse the records a
//! nicval server keeps.
//!
//! # Usage
//!
//! ```text
//! nicval decode 891234567V --as-of 2024-06-01
//! nicval batch uploads/*.csv --column NIC --out report.csv
//! nicval lookup 200012345678 --record --url http://localhost:8080
//! nicval records --status invalid --out invalid.csv
//! nicval dashboard --config ~/.config/nicval/config.toml
//! ```

mod app;
mod client;
mod commands;
mod ui;

use std::{io, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use app::App;
use chrono::{NaiveDate, Utc};
use nicval_core::record::{RecordTable, ValidationKind};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, RecordFilter, ServicesClient, ServicesConfig};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8080";
const DEFAULT_VALIDATION_URL: &str = "https://nic-val-api.onrender.com";
const DEFAULT_GEO_URL: &str = "https://ipinfo.io/json";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "nicval", version, about = "Sri Lankan NIC decoding and validation")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Base URL of the nicval server.
  #[arg(long, env = "NICVAL_URL", global = true)]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "NICVAL_USER", global = true)]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "NICVAL_PASSWORD", global = true, hide_env_values = true)]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Decode one identifier.
  Decode {
    nic:   String,
    /// Reference date for the age (default: today, UTC).
    #[arg(long, value_name = "YYYY-MM-DD")]
    as_of: Option<NaiveDate>,
    /// Print the decoded identity as JSON.
    #[arg(long)]
    json:  bool,
  },

  /// Print every identifier found in a file.
  Extract { file: PathBuf },

  /// Decode every identifier in CSV or plain-text files and write a report.
  Batch {
    #[arg(required = true)]
    files:  Vec<PathBuf>,
    /// Read only this column of headed CSV files instead of scanning every
    /// cell.
    #[arg(long)]
    column: Option<String>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    as_of:  Option<NaiveDate>,
    /// Write the CSV report here instead of stdout.
    #[arg(long, value_name = "FILE")]
    out:    Option<PathBuf>,
  },

  /// Decode locally and cross-check with the external validation service.
  Lookup {
    nic:            String,
    #[arg(long, value_name = "YYYY-MM-DD")]
    as_of:          Option<NaiveDate>,
    /// Store the result on the nicval server.
    #[arg(long)]
    record:         bool,
    #[arg(long, env = "NICVAL_VALIDATION_URL")]
    validation_url: Option<String>,
    #[arg(long, env = "NICVAL_GEO_URL")]
    geo_url:        Option<String>,
    #[arg(long, env = "NICVAL_GEO_TOKEN", hide_env_values = true)]
    geo_token:      Option<String>,
  },

  /// Export the records stored on the nicval server as CSV.
  Records {
    /// `valid` or `invalid`.
    #[arg(long)]
    status: Option<RecordTable>,
    /// `single` or `bulk`.
    #[arg(long)]
    kind:   Option<ValidationKind>,
    /// Write the CSV here instead of stdout.
    #[arg(long, value_name = "FILE")]
    out:    Option<PathBuf>,
  },

  /// Browse stored records and statistics in a terminal dashboard.
  Dashboard,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:            String,
  #[serde(default)]
  username:       String,
  #[serde(default)]
  password:       String,
  #[serde(default)]
  validation_url: String,
  #[serde(default)]
  geo_url:        String,
  #[serde(default)]
  geo_token:      String,
}

/// Flag (or env) value, else the config file's non-empty value.
fn pick(flag: Option<String>, file: &str) -> Option<String> {
  flag.or_else(|| (!file.is_empty()).then(|| file.to_string()))
}

fn today() -> NaiveDate { Utc::now().date_naive() }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let api_config = ApiConfig {
    base_url: pick(args.url, &file_cfg.url).unwrap_or_else(|| DEFAULT_URL.to_string()),
    username: pick(args.user, &file_cfg.username).unwrap_or_default(),
    password: pick(args.password, &file_cfg.password).unwrap_or_default(),
  };

  match args.command {
    Command::Decode { nic, as_of, json } => {
      commands::decode(&nic, as_of.unwrap_or_else(today), json)
    }
    Command::Extract { file } => commands::extract(&file),
    Command::Batch {
      files,
      column,
      as_of,
      out,
    } => commands::batch(
      &files,
      column.as_deref(),
      as_of.unwrap_or_else(today),
      out.as_deref(),
    ),
    Command::Lookup {
      nic,
      as_of,
      record,
      validation_url,
      geo_url,
      geo_token,
    } => {
      let services = ServicesClient::new(ServicesConfig {
        validation_url: pick(validation_url, &file_cfg.validation_url)
          .unwrap_or_else(|| DEFAULT_VALIDATION_URL.to_string()),
        geo_url:        pick(geo_url, &file_cfg.geo_url)
          .unwrap_or_else(|| DEFAULT_GEO_URL.to_string()),
        geo_token:      pick(geo_token, &file_cfg.geo_token),
      })?;
      let api = if record {
        Some(ApiClient::new(api_config)?)
      } else {
        None
      };
      commands::lookup(&nic, as_of.unwrap_or_else(today), &services, api.as_ref())
        .await
    }
    Command::Records { status, kind, out } => {
      let api = ApiClient::new(api_config)?;
      commands::records(&api, &RecordFilter { status, kind }, out.as_deref()).await
    }
    Command::Dashboard => run_dashboard(ApiClient::new(api_config)?).await,
  }
}

// ─── Dashboard ────────────────────────────────────────────────────────────────

async fn run_dashboard(client: ApiClient) -> Result<()> {
  let mut app = App::new(client);
  app.load().await?;

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore the terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key).await?
    {
      break;
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn records_filters_parse() {
    let args = Args::try_parse_from([
      "nicval", "records", "--status", "invalid", "--kind", "bulk", "--out", "bad.csv",
    ])
    .unwrap();
    let Command::Records { status, kind, out } = args.command else {
      panic!("expected the records subcommand");
    };
    assert_eq!(status, Some(RecordTable::Invalid));
    assert_eq!(kind, Some(ValidationKind::Bulk));
    assert_eq!(out, Some(PathBuf::from("bad.csv")));
  }

  #[test]
  fn records_rejects_unknown_status() {
    assert!(Args::try_parse_from(["nicval", "records", "--status", "pending"]).is_err());
  }
}
