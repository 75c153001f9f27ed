//! HTTP server for nicval.
//!
//! Mounts the JSON API from [`nicval_api`] under `/api` behind HTTP Basic
//! auth, plus an unauthenticated `/health` probe. Every request is traced.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Json, Router, middleware, routing::get};
use nicval_core::store::RecordStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `NICVAL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("nicval.db") }

impl ServerConfig {
  /// Read `path` (optional) overlaid with `NICVAL_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("NICVAL"))
      .build()?
      .try_deserialize()
  }

  /// `host:port` to bind.
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// The store path with a leading `~/` expanded to `$HOME`.
  pub fn resolved_store_path(&self) -> PathBuf {
    let s = self.store_path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/")
      && let Ok(home) = std::env::var("HOME")
    {
      return PathBuf::from(home).join(rest);
    }
    self.store_path.clone()
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state the router is built from.
#[derive(Clone)]
pub struct AppState<S: RecordStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server's axum [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + 'static,
{
  let api = nicval_api::api_router(state.store)
    .layer(middleware::from_fn_with_state(state.auth, require_auth));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
  Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use nicval_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  async fn make_state(password: &str) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState {
      store: Arc::new(store),
      auth:  Arc::new(AuthConfig {
        username:      "clerk".to_string(),
        password_hash: auth::hash_password(password).unwrap(),
      }),
    }
  }

  fn auth_header() -> String {
    format!("Basic {}", B64.encode("clerk:secret"))
  }

  async fn send(
    app:    &Router,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::AUTHORIZATION, auth_header());
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    let resp = app
      .clone()
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();

    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn app() -> Router { router(make_state("secret").await) }

  // ── Configuration ───────────────────────────────────────────────────────────

  #[test]
  fn config_file_fills_defaults() {
    let path = std::env::temp_dir().join(format!(
      "nicval-server-config-{}.toml",
      std::process::id()
    ));
    std::fs::write(
      &path,
      "auth_username = \"clerk\"\nauth_password_hash = \"$argon2id$x\"\nport = 9090\n",
    )
    .unwrap();

    let config = ServerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.address(), "127.0.0.1:9090");
    assert_eq!(config.store_path, PathBuf::from("nicval.db"));
    assert_eq!(AuthConfig::from(&config).username, "clerk");
  }

  #[test]
  fn store_path_expands_home() {
    let config = ServerConfig {
      host:               "0.0.0.0".to_string(),
      port:               8080,
      store_path:         PathBuf::from("~/nicval/records.db"),
      auth_username:      "clerk".to_string(),
      auth_password_hash: String::new(),
    };
    let Ok(home) = std::env::var("HOME") else {
      return;
    };
    assert_eq!(
      config.resolved_store_path(),
      PathBuf::from(home).join("nicval/records.db")
    );
    assert_eq!(config.address(), "0.0.0.0:8080");
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_needs_no_auth() {
    let app = app().await;
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_requires_auth() {
    let app = app().await;
    let req = Request::builder()
      .method("POST")
      .uri("/api/extract")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(r#"{"text":"891234567V"}"#))
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  // ── Decoding ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn decode_returns_identity() {
    let app = app().await;
    let (status, body) = send(
      &app,
      "POST",
      "/api/decode",
      Some(json!({ "nic": "891234567V", "as_of": "2024-06-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["birth_date"], "1989-05-03");
    assert_eq!(body["gender"], "Male");
    assert_eq!(body["vote_eligibility"], "eligible");
    assert_eq!(body["age"], 35);
  }

  #[tokio::test]
  async fn decode_rejects_malformed_identifier() {
    let app = app().await;
    let (status, body) =
      send(&app, "POST", "/api/decode", Some(json!({ "nic": "12345" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("invalid NIC format"));
  }

  #[tokio::test]
  async fn extract_and_batch() {
    let app = app().await;
    let (status, body) = send(
      &app,
      "POST",
      "/api/extract",
      Some(json!({ "text": "ids: 891234567V, 200012345678 and 1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["891234567V", "200012345678"]));

    let (status, body) = send(
      &app,
      "POST",
      "/api/batch",
      Some(json!({ "blocks": ["891234567V", "", "785011234x"], "as_of": "2024-06-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["as_of"], "2024-06-01");
    assert_eq!(body["entries"].as_array().unwrap().len(), 2);
    assert_eq!(body["entries"][1]["block"], 2);
    assert_eq!(body["entries"][1]["outcome"]["outcome"], "decoded");
  }

  // ── Records ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn record_then_fetch() {
    let app = app().await;
    let new = json!({ "nic": "891234567v", "status": { "status": "valid" } });

    let (status, body) = send(&app, "POST", "/api/records", Some(new.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["nic"], "891234567V");
    assert_eq!(body["duplicate_count"], 0);

    let (_, body) = send(&app, "POST", "/api/records", Some(new)).await;
    assert_eq!(body["duplicate_count"], 1);

    let (status, body) = send(&app, "GET", "/api/records/891234567V", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "single");
    assert_eq!(body["identity"]["birth_month"], 5);
  }

  #[tokio::test]
  async fn unknown_record_is_404() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/api/records/200012345678", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn empty_nic_is_rejected() {
    let app = app().await;
    let new = json!({ "nic": "  ", "status": { "status": "valid" } });
    let (status, _) = send(&app, "POST", "/api/records", Some(new)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Uploads and stats ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn upload_records_every_entry() {
    let app = app().await;
    let csv = "name,nic\nAsha,885011234X\nRavi,891234567V\nRavi again,891234567v\n";
    let (status, body) = send(
      &app,
      "POST",
      "/api/uploads",
      Some(json!({ "name": "march.csv", "csv": csv, "as_of": "2024-06-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["entries"].as_array().unwrap().len(), 3);

    let (_, uploads) = send(&app, "GET", "/api/uploads", None).await;
    assert_eq!(uploads[0]["name"], "march.csv");
    assert_eq!(uploads[0]["nics"].as_array().unwrap().len(), 3);

    let (_, records) = send(&app, "GET", "/api/records?kind=bulk", None).await;
    assert_eq!(records.as_array().unwrap().len(), 2);

    let (_, invalid) = send(&app, "GET", "/api/records?status=invalid", None).await;
    assert!(invalid.as_array().unwrap().is_empty());

    let (status, stats) = send(&app, "GET", "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["valid"], 2);
    assert_eq!(stats["duplicates"], 1);
    assert_eq!(stats["birth_months"][0]["female"], 1);
  }

  #[tokio::test]
  async fn upload_keeps_malformed_column_values() {
    let app = app().await;
    let csv = "Name,NIC\nAsha,12345\nRavi,89123456V\nKumar,891234567V\n";
    let (status, body) = send(
      &app,
      "POST",
      "/api/uploads",
      Some(json!({ "name": "april.csv", "csv": csv, "as_of": "2024-06-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["outcome"]["outcome"], "invalid");

    let (_, invalid) = send(&app, "GET", "/api/records?status=invalid", None).await;
    let mut nics: Vec<_> = invalid
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["nic"].as_str().unwrap().to_string())
      .collect();
    nics.sort();
    assert_eq!(nics, vec!["12345", "89123456V"]);

    let (_, uploads) = send(&app, "GET", "/api/uploads", None).await;
    assert_eq!(uploads[0]["nics"], json!(["12345", "89123456V", "891234567V"]));
  }

  #[tokio::test]
  async fn upload_without_nic_column_scans_cells() {
    let app = app().await;
    let csv = "holder,notes\nAsha,card 885011234X renewed\n";
    let (status, body) = send(
      &app,
      "POST",
      "/api/uploads",
      Some(json!({ "name": "notes.csv", "csv": csv, "as_of": "2024-06-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);
    assert_eq!(body["entries"][0]["raw"], "885011234X");
  }

  #[tokio::test]
  async fn upload_with_unknown_column_is_rejected() {
    let app = app().await;
    let csv = "Name,NIC\nAsha,885011234X\n";
    let (status, body) = send(
      &app,
      "POST",
      "/api/uploads",
      Some(json!({ "name": "may.csv", "csv": csv, "column": "Identity" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Identity"));
  }
}
