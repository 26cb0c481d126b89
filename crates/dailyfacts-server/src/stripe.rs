//! [`StripeClient`]: the [`PaymentProvider`] used in production.

use std::time::Duration;

use dailyfacts_core::collab::{PaymentIntent, PaymentProvider};
use reqwest::Client;
use serde::Deserialize;

use crate::error::StripeError;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Reads payment intents with a secret key. Without a key every lookup fails
/// with [`StripeError::NotConfigured`].
#[derive(Clone)]
pub struct StripeClient {
  client:     Client,
  api_base:   String,
  secret_key: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
  #[serde(default)]
  message: String,
}

impl StripeClient {
  pub fn new(api_base: impl Into<String>, secret_key: Option<String>) -> Result<Self, StripeError> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self {
      client,
      api_base: api_base.into(),
      secret_key: secret_key.filter(|k| !k.trim().is_empty()),
    })
  }

  fn url(&self, id: &str) -> String {
    format!("{}/v1/payment_intents/{id}", self.api_base.trim_end_matches('/'))
  }
}

impl PaymentProvider for StripeClient {
  type Error = StripeError;

  async fn retrieve(&self, id: &str) -> Result<PaymentIntent, StripeError> {
    let key = self.secret_key.as_deref().ok_or(StripeError::NotConfigured)?;

    let resp = self.client.get(self.url(id)).bearer_auth(key).send().await?;
    let status = resp.status();
    if !status.is_success() {
      let message = resp
        .json::<ErrorBody>()
        .await
        .map(|b| b.error.message)
        .unwrap_or_default();
      return Err(StripeError::Api { status: status.as_u16(), message });
    }

    Ok(resp.json().await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn missing_key_fails_without_a_request() {
    let client = StripeClient::new("http://127.0.0.1:9", None).unwrap();
    assert!(matches!(
      client.retrieve("pi_1").await,
      Err(StripeError::NotConfigured)
    ));

    let blank = StripeClient::new(DEFAULT_API_BASE, Some("  ".into())).unwrap();
    assert!(matches!(blank.retrieve("pi_1").await, Err(StripeError::NotConfigured)));
  }

  #[test]
  fn url_joins_base_and_id() {
    let client = StripeClient::new("https://example.test/", Some("sk".into())).unwrap();
    assert_eq!(client.url("pi_9"), "https://example.test/v1/payment_intents/pi_9");
  }
}
