//! Handlers for `/uploads`: bulk validation of a submitted CSV file.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/uploads` | `?limit=` (default 5), newest first |
//! | `POST` | `/uploads` | Body: `{"name":"march.csv","csv":"...","column":"NIC","as_of":"2024-06-01"}` |
//!
//! When the header has the identifier column (`column`, or `NIC` by default)
//! every value in it is decoded as it stands, so malformed entries are kept
//! as invalid. A file without that column falls back to scanning every cell
//! for identifiers. Each entry is recorded as a bulk sighting, and the upload
//! itself is stored with the identifiers it contained.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use nicval_core::{
  Batch, decode_blocks, decode_identifiers,
  record::{NewRecord, UploadedFile, ValidationKind},
  store::RecordStore,
};
use serde::Deserialize;

use crate::{error::ApiError, reference_date};

const DEFAULT_RECENT: usize = 5;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub limit: Option<usize>,
}

/// `GET /uploads`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<UploadedFile>>, ApiError>
where
  S: RecordStore,
{
  let uploads = store
    .recent_uploads(params.limit.unwrap_or(DEFAULT_RECENT))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(uploads))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UploadBody {
  pub name:   String,
  pub csv:    String,
  /// Header naming the identifier column. When given, the column must exist.
  #[serde(default)]
  pub column: Option<String>,
  #[serde(default)]
  pub as_of:  Option<NaiveDate>,
}

/// Decode the identifier column, or every cell when the file has no such
/// column and none was asked for.
fn decode_upload(
  csv: &str,
  column: Option<&str>,
  as_of: NaiveDate,
) -> Result<Batch, ApiError> {
  let wanted = column.unwrap_or(nicval_csv::DEFAULT_NIC_COLUMN);
  match nicval_csv::read_nic_column(csv.as_bytes(), wanted) {
    Ok(values) => Ok(decode_identifiers(&values, as_of)),
    Err(nicval_csv::Error::MissingColumn(_)) if column.is_none() => {
      let cells = nicval_csv::read_cells(csv.as_bytes())?;
      Ok(decode_blocks(&cells, as_of))
    }
    Err(e) => Err(e.into()),
  }
}

/// `POST /uploads`, returning the decoded batch.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<UploadBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  let as_of = reference_date(body.as_of);
  let batch = decode_upload(&body.csv, body.column.as_deref(), as_of)?;

  for entry in &batch.entries {
    store
      .record(NewRecord::from_entry(entry, ValidationKind::Bulk), as_of)
      .await
      .map_err(ApiError::store)?;
  }

  let nics = batch.entries.iter().map(|e| e.raw.clone()).collect();
  let upload = store
    .record_upload(body.name, nics)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    file_id = %upload.file_id,
    name = %upload.name,
    entries = batch.len(),
    valid = batch.valid().count(),
    invalid = batch.invalid().count(),
    duplicates = batch.duplicate_count(),
    "processed upload"
  );
  Ok((StatusCode::CREATED, Json(batch)))
}
