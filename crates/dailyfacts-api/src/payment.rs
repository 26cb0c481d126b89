//! `POST /verify-payment`: check a payment intent with the billing provider.
//!
//! A succeeded intent answers 200 with `verified: true`; any other status
//! answers 400 with `verified: false` and the provider's status string. The
//! agent grants premium only on the former.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use dailyfacts_core::collab::PaymentProvider;
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyBody {
  pub payment_intent_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Verification {
  pub success:  bool,
  pub verified: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub amount:   Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub currency: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status:   Option<String>,
}

pub async fn verify<S, P>(
  State(state): State<ApiState<S, P>>,
  Json(body): Json<VerifyBody>,
) -> Result<Response, ApiError>
where
  P: PaymentProvider,
{
  let id = body
    .payment_intent_id
    .filter(|id| !id.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest("Payment intent ID is required".into()))?;

  let intent = state
    .payments
    .retrieve(id.trim())
    .await
    .map_err(|e| ApiError::Payment(Box::new(e)))?;

  if intent.succeeded() {
    tracing::info!(id = %intent.id, "payment verified");
    let body = Verification {
      success:  true,
      verified: true,
      amount:   intent.amount,
      currency: intent.currency,
      status:   None,
    };
    Ok((StatusCode::OK, Json(body)).into_response())
  } else {
    tracing::warn!(id = %intent.id, status = %intent.status, "payment not succeeded");
    let body = Verification {
      success:  false,
      verified: false,
      amount:   None,
      currency: None,
      status:   Some(intent.status),
    };
    Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
  }
}
