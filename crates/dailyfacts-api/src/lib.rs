//! JSON REST API for Daily Facts.
//!
//! Exposes an axum [`Router`] backed by any
//! [`dailyfacts_core::store::FactStore`] and
//! [`dailyfacts_core::collab::PaymentProvider`]. TLS, CORS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", dailyfacts_api::api_router(state))
//! ```

pub mod auth;
pub mod bulk;
pub mod error;
pub mod facts;
pub mod health;
pub mod payment;
pub mod stats;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use dailyfacts_core::{collab::PaymentProvider, store::FactStore};

pub use auth::AdminCredentials;
pub use error::ApiError;

/// Shared handler state.
pub struct ApiState<S, P> {
  pub store:    Arc<S>,
  pub payments: Arc<P>,
  /// When `None` the write routes are open.
  pub admin:    Option<Arc<AdminCredentials>>,
}

impl<S, P> ApiState<S, P> {
  pub fn new(store: Arc<S>, payments: Arc<P>) -> Self {
    Self { store, payments, admin: None }
  }

  pub fn with_admin(mut self, creds: AdminCredentials) -> Self {
    self.admin = Some(Arc::new(creds));
    self
  }
}

impl<S, P> Clone for ApiState<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      payments: Arc::clone(&self.payments),
      admin:    self.admin.clone(),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, P>(state: ApiState<S, P>) -> Router<()>
where
  S: FactStore + 'static,
  P: PaymentProvider + 'static,
{
  Router::new()
    // Facts
    .route("/facts", get(facts::list::<S, P>).post(facts::create::<S, P>))
    .route(
      "/facts/{id}",
      get(facts::get_one::<S, P>)
        .put(facts::update::<S, P>)
        .delete(facts::delete::<S, P>),
    )
    .route("/facts/bulk-upload", post(bulk::upload::<S, P>))
    // Stats
    .route("/stats", get(stats::handler::<S, P>))
    // Payments
    .route("/verify-payment", post(payment::verify::<S, P>))
    // Health
    .route("/health", get(health::handler))
    .with_state(state)
}
