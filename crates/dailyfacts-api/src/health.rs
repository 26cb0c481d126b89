//! `GET /health`: liveness probe.

use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

pub const API_VERSION: &str = "1.0.0";

#[derive(Debug, Serialize)]
pub struct Health {
  pub success:   bool,
  pub message:   &'static str,
  pub timestamp: String,
  pub version:   &'static str,
}

pub async fn handler() -> Json<Health> {
  Json(Health {
    success:   true,
    message:   "API is healthy",
    timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    version:   API_VERSION,
  })
}
