//! JSON REST API for nicval.
//!
//! Exposes an axum [`Router`] backed by any [`nicval_core::store::RecordStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! Every handler that reports ages accepts an optional `as_of` date and falls
//! back to today's UTC date.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", nicval_api::api_router(store.clone()))
//! ```

pub mod decode;
pub mod error;
pub mod records;
pub mod stats;
pub mod uploads;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use nicval_core::store::RecordStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RecordStore + Send + Sync + 'static,
{
  Router::new()
    // Stateless decoding
    .route("/decode", post(decode::decode_one))
    .route("/extract", post(decode::extract))
    .route("/batch", post(decode::batch))
    // Records
    .route("/records", get(records::list::<S>).post(records::create::<S>))
    .route("/records/{nic}", get(records::get_one::<S>))
    // Uploads
    .route("/uploads", get(uploads::list::<S>).post(uploads::create::<S>))
    // Dashboard
    .route("/stats", get(stats::summary::<S>))
    .with_state(store)
}

/// The reference date a request asked for, or today.
pub(crate) fn reference_date(as_of: Option<NaiveDate>) -> NaiveDate {
  as_of.unwrap_or_else(|| Utc::now().date_naive())
}
