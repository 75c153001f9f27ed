//! Handlers for `/records` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/records` | Optional `?status=valid\|invalid&kind=single\|bulk&limit&offset&as_of` |
//! | `POST` | `/records` | Body: a `NewRecord` |
//! | `GET`  | `/records/{nic}` | 404 if never seen |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use nicval_core::{
  record::{NewRecord, RecordTable, ValidationKind, ValidationRecord},
  store::{RecordQuery, RecordStore},
};
use serde::Deserialize;

use crate::{error::ApiError, reference_date};

#[derive(Debug, Deserialize, Default)]
pub struct AsOfParams {
  pub as_of: Option<NaiveDate>,
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// `valid` (or `validated`) / `invalid`; both when absent.
  pub status: Option<RecordTable>,
  pub kind:   Option<ValidationKind>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
  pub as_of:  Option<NaiveDate>,
}

/// `GET /records`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ValidationRecord>>, ApiError>
where
  S: RecordStore,
{
  let query = RecordQuery {
    table:  params.status,
    kind:   params.kind,
    limit:  params.limit,
    offset: params.offset,
  };
  let records = store
    .list(&query, reference_date(params.as_of))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /records`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<AsOfParams>,
  Json(body): Json<NewRecord>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  if body.nic.trim().is_empty() {
    return Err(ApiError::BadRequest("nic must not be empty".to_string()));
  }

  let record = store
    .record(body, reference_date(params.as_of))
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    nic = %record.nic,
    valid = record.status.is_valid(),
    duplicates = record.duplicate_count,
    "recorded NIC"
  );
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /records/{nic}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(nic): Path<String>,
  Query(params): Query<AsOfParams>,
) -> Result<Json<ValidationRecord>, ApiError>
where
  S: RecordStore,
{
  let record = store
    .get(&nic, reference_date(params.as_of))
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("NIC {nic} not found")))?;
  Ok(Json(record))
}
