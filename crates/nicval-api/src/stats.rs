//! Handler for `GET /stats`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use nicval_core::{
  stats::{Summary, summarize},
  store::{RecordQuery, RecordStore},
};

use crate::{error::ApiError, records::AsOfParams, reference_date};

/// `GET /stats[?as_of=YYYY-MM-DD]`, summarising every stored record.
pub async fn summary<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<AsOfParams>,
) -> Result<Json<Summary>, ApiError>
where
  S: RecordStore,
{
  let records = store
    .list(&RecordQuery::default(), reference_date(params.as_of))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(summarize(&records)))
}
