//! `GET /stats`: fact counts across the whole store.

use axum::{Json, extract::State};
use dailyfacts_core::store::{FactStats, FactStore};
use serde::Serialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct StatsResponse {
  pub success: bool,
  pub stats:   FactStats,
}

pub async fn handler<S, P>(
  State(state): State<ApiState<S, P>>,
) -> Result<Json<StatsResponse>, ApiError>
where
  S: FactStore,
{
  let stats = state.store.stats().await.map_err(ApiError::store)?;
  Ok(Json(StatsResponse { success: true, stats }))
}
