//! Error types for the server crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("admin_username and admin_password_hash must be set together")]
  IncompleteAdminCredentials,

  #[error("invalid admin_password_hash: {0}")]
  InvalidPasswordHash(String),
}

/// Failure talking to the Stripe REST API.
#[derive(Debug, Error)]
pub enum StripeError {
  #[error("stripe_secret_key is not configured")]
  NotConfigured,

  #[error("stripe request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// Stripe answered with a non-success status.
  #[error("stripe returned {status}: {message}")]
  Api { status: u16, message: String },
}
