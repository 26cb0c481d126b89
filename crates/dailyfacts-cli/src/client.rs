//! Async HTTP client for the Daily Facts JSON API.
//!
//! Implements the agent's [`FactSource`] and [`PaymentProvider`] seams over
//! `GET /api/facts` and `POST /api/verify-payment`.

use std::time::Duration;

use dailyfacts_core::{
  collab::{FactSource, PaymentIntent, PaymentProvider},
  fact::{Category, Fact},
};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{path} returned {status}: {message}")]
  Status {
    path:    &'static str,
    status:  u16,
    message: String,
  },
}

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

#[derive(Deserialize)]
struct FactList {
  facts: Vec<Fact>,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Either shape `/verify-payment` answers with.
#[derive(Deserialize)]
struct VerifyResponse {
  #[serde(default)]
  verified: bool,
  amount:   Option<i64>,
  currency: Option<String>,
  status:   Option<String>,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str { &self.config.base_url }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  async fn failure(path: &'static str, resp: Response) -> ClientError {
    let status = resp.status().as_u16();
    let message = resp
      .json::<ErrorBody>()
      .await
      .map(|b| b.error)
      .unwrap_or_default();
    ClientError::Status { path, status, message }
  }
}

impl FactSource for ApiClient {
  type Error = ClientError;

  /// `GET /api/facts?category=<c>&limit=<n>&hidden=false`
  async fn fetch(
    &self,
    category: Option<Category>,
    limit: Option<usize>,
  ) -> Result<Vec<Fact>, ClientError> {
    let mut query = vec![
      ("category", category.map_or("all", Category::as_str).to_owned()),
      ("hidden", "false".to_owned()),
    ];
    if let Some(limit) = limit {
      query.push(("limit", limit.to_string()));
    }

    let resp = self.client.get(self.url("/facts")).query(&query).send().await?;
    if !resp.status().is_success() {
      return Err(Self::failure("/facts", resp).await);
    }
    Ok(resp.json::<FactList>().await?.facts)
  }
}

impl PaymentProvider for ApiClient {
  type Error = ClientError;

  /// `POST /api/verify-payment`. A 400 carrying a `status` is a valid answer
  /// for an intent that has not succeeded.
  async fn retrieve(&self, id: &str) -> Result<PaymentIntent, ClientError> {
    let resp = self
      .client
      .post(self.url("/verify-payment"))
      .json(&json!({ "paymentIntentId": id }))
      .send()
      .await?;

    let status = resp.status();
    if status != StatusCode::OK && status != StatusCode::BAD_REQUEST {
      return Err(Self::failure("/verify-payment", resp).await);
    }

    let bytes = resp.bytes().await?;
    let body = serde_json::from_slice::<VerifyResponse>(&bytes).ok();
    match body {
      Some(v) if status == StatusCode::OK && v.verified => Ok(PaymentIntent {
        id:       id.to_owned(),
        status:   "succeeded".to_owned(),
        amount:   v.amount,
        currency: v.currency,
      }),
      Some(VerifyResponse { status: Some(intent_status), .. }) => Ok(PaymentIntent {
        id:       id.to_owned(),
        status:   intent_status,
        amount:   None,
        currency: None,
      }),
      _ => Err(ClientError::Status {
        path:    "/verify-payment",
        status:  status.as_u16(),
        message: serde_json::from_slice::<ErrorBody>(&bytes)
          .map(|b| b.error)
          .unwrap_or_default(),
      }),
    }
  }
}
