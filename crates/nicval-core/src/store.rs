//! The `RecordStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `nicval-store-sqlite`).
//! Higher layers (`nicval-api`, `nicval-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::record::{
  NewRecord, RecordTable, UploadedFile, ValidationKind, ValidationRecord,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`RecordStore::list`].
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
  /// Restrict to one table; both when `None`.
  pub table:  Option<RecordTable>,
  pub kind:   Option<ValidationKind>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a validation-record store backend.
///
/// Records are keyed by the upper-cased identifier within their table.
/// Decoded identities are never stored: every read takes the reference date
/// the identity (and its age) is derived for.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Records ───────────────────────────────────────────────────────────

  /// Insert a record, or register another sighting of an existing one.
  ///
  /// A repeated identifier keeps its `first_seen` and gets a fresh
  /// `last_seen` plus one more `duplicate_count`. Its invalid reason is
  /// replaced; location and reported eligibility are replaced only when the
  /// newer sighting carries them.
  fn record(
    &self,
    input: NewRecord,
    as_of: NaiveDate,
  ) -> impl Future<Output = Result<ValidationRecord, Self::Error>> + Send + '_;

  /// Look an identifier up in either table. A validated record wins when the
  /// identifier is present in both.
  fn get<'a>(
    &'a self,
    nic: &'a str,
    as_of: NaiveDate,
  ) -> impl Future<Output = Result<Option<ValidationRecord>, Self::Error>> + Send + 'a;

  /// List records, most recently seen first.
  fn list<'a>(
    &'a self,
    query: &'a RecordQuery,
    as_of: NaiveDate,
  ) -> impl Future<Output = Result<Vec<ValidationRecord>, Self::Error>> + Send + 'a;

  // ── Uploads ───────────────────────────────────────────────────────────

  /// Register an uploaded file and the identifiers found in it.
  fn record_upload(
    &self,
    name: String,
    nics: Vec<String>,
  ) -> impl Future<Output = Result<UploadedFile, Self::Error>> + Send + '_;

  /// The `limit` most recent uploads, newest first.
  fn recent_uploads(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<UploadedFile>, Self::Error>> + Send + '_;
}
