//! Collaborator traits for the delivery agent: where facts come from, how the
//! user is told about them, how the daily trigger is registered and how
//! payments are checked.
//!
//! Each trait is implemented by the CLI for real use and by in-test fakes.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::fact::{Category, Fact};

// ─── Fact pool ───────────────────────────────────────────────────────────────

/// Read access to the remote fact pool.
pub trait FactSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch visible facts, optionally restricted to one category. With a
  /// `limit` the pool returns that many facts in random order.
  fn fetch(
    &self,
    category: Option<Category>,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<Fact>, Self::Error>> + Send + '_;
}

// ─── Notifications ───────────────────────────────────────────────────────────

/// Fire-and-forget user notification.
pub trait Notifier: Send + Sync {
  fn show(&self, title: &str, body: &str);
}

// ─── Timer ───────────────────────────────────────────────────────────────────

/// Registry of named recurring triggers.
///
/// Scheduling a name that is already registered replaces it, so at most one
/// trigger per name is active.
pub trait Timer: Send + Sync {
  fn schedule(&self, name: &str, first_fire: DateTime<Utc>, period: Duration);
}

// ─── Payments ────────────────────────────────────────────────────────────────

/// A payment intent as reported by the billing provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
  pub id:       String,
  pub status:   String,
  #[serde(default)]
  pub amount:   Option<i64>,
  #[serde(default)]
  pub currency: Option<String>,
}

impl PaymentIntent {
  pub fn succeeded(&self) -> bool { self.status == "succeeded" }
}

pub trait PaymentProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn retrieve<'a>(
    &'a self,
    payment_intent_id: &'a str,
  ) -> impl Future<Output = Result<PaymentIntent, Self::Error>> + Send + 'a;
}
