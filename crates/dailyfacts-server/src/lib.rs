//! HTTP server for the Daily Facts backend.
//!
//! Mounts the JSON API from `dailyfacts-api` under `/api`, adds a root
//! `/health` probe, permissive CORS for the browser agent and request
//! tracing.

pub mod error;
pub mod stripe;

pub use error::{Error, StripeError};

use std::path::PathBuf;

use argon2::PasswordHash;
use axum::{
  Router,
  http::{Method, header},
  routing::get,
};
use dailyfacts_api::{AdminCredentials, ApiState, api_router, health};
use dailyfacts_core::{collab::PaymentProvider, store::FactStore};
use serde::Deserialize;
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 3000 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/dailyfacts/facts.db") }
fn default_stripe_api_base() -> String { stripe::DEFAULT_API_BASE.to_owned() }

/// Runtime server configuration, deserialised from `config.toml` and
/// `DAILYFACTS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  /// Leave both admin fields unset to run the write routes open.
  pub admin_username:      Option<String>,
  pub admin_password_hash: Option<String>,
  pub stripe_secret_key:   Option<String>,
  #[serde(default = "default_stripe_api_base")]
  pub stripe_api_base:     String,
}

impl ServerConfig {
  /// Admin credentials for the write routes, if configured.
  pub fn admin_credentials(&self) -> Result<Option<AdminCredentials>, Error> {
    match (&self.admin_username, &self.admin_password_hash) {
      (None, None) => Ok(None),
      (Some(username), Some(hash)) => {
        PasswordHash::new(hash).map_err(|e| Error::InvalidPasswordHash(e.to_string()))?;
        Ok(Some(AdminCredentials {
          username:      username.clone(),
          password_hash: hash.clone(),
        }))
      }
      _ => Err(Error::IncompleteAdminCredentials),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// CORS for the browser agent: any origin, the API's methods, JSON and Basic
/// auth headers.
pub fn cors_layer() -> CorsLayer {
  CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([
      Method::GET,
      Method::POST,
      Method::PUT,
      Method::DELETE,
      Method::OPTIONS,
    ])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build the complete application router.
pub fn app<S, P>(state: ApiState<S, P>) -> Router
where
  S: FactStore + 'static,
  P: PaymentProvider + 'static,
{
  Router::new()
    .nest("/api", api_router(state))
    .route("/health", get(health::handler))
    .layer(cors_layer())
    .layer(TraceLayer::new_for_http())
}
