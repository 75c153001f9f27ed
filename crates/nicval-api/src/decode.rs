//! Stateless handlers: decoding, extraction and batch runs. Nothing here
//! touches the store.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/decode`  | Body: `{"nic":"891234567V","as_of":"2024-06-01"}`; 422 if it does not decode |
//! | `POST` | `/extract` | Body: `{"text":"..."}` |
//! | `POST` | `/batch`   | Body: `{"blocks":["...", "..."],"as_of":"2024-06-01"}` |

use axum::Json;
use chrono::NaiveDate;
use nicval_core::{
  Batch, DecodedIdentity, decode_blocks, decode_identifier, extract_identifiers,
};
use serde::Deserialize;

use crate::{error::ApiError, reference_date};

#[derive(Debug, Deserialize)]
pub struct DecodeBody {
  pub nic:   String,
  #[serde(default)]
  pub as_of: Option<NaiveDate>,
}

/// `POST /decode`
pub async fn decode_one(
  Json(body): Json<DecodeBody>,
) -> Result<Json<DecodedIdentity>, ApiError> {
  let identity = decode_identifier(&body.nic, reference_date(body.as_of))?;
  Ok(Json(identity))
}

#[derive(Debug, Deserialize)]
pub struct ExtractBody {
  pub text: String,
}

/// `POST /extract`
pub async fn extract(Json(body): Json<ExtractBody>) -> Json<Vec<String>> {
  Json(
    extract_identifiers(&body.text)
      .map(str::to_owned)
      .collect(),
  )
}

#[derive(Debug, Deserialize)]
pub struct BatchBody {
  pub blocks: Vec<String>,
  #[serde(default)]
  pub as_of:  Option<NaiveDate>,
}

/// `POST /batch`
pub async fn batch(Json(body): Json<BatchBody>) -> Json<Batch> {
  let batch = decode_blocks(&body.blocks, reference_date(body.as_of));
  tracing::debug!(
    blocks = body.blocks.len(),
    entries = batch.len(),
    "decoded batch"
  );
  Json(batch)
}
