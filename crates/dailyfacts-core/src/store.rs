//! The `FactStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `dailyfacts-store-sqlite`).
//! The HTTP layer (`dailyfacts-api`) depends on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::fact::{Category, Fact, FactUpdate, NewFact};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Result ordering for [`FactStore::list_facts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactOrder {
  /// Most recently added first.
  #[default]
  Newest,
  Random,
}

/// Parameters for [`FactStore::list_facts`].
#[derive(Debug, Clone, Default)]
pub struct FactQuery {
  /// `None` means every category.
  pub category: Option<Category>,
  /// Restrict to hidden (`Some(true)`) or visible (`Some(false)`) facts.
  pub hidden:   Option<bool>,
  pub limit:    Option<usize>,
  pub order:    FactOrder,
}

impl FactQuery {
  /// Visible facts only, in any category.
  pub fn visible() -> Self { Self { hidden: Some(false), ..Self::default() } }
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
  pub category: Category,
  pub count:    u64,
}

/// Aggregate counts over the whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactStats {
  pub total:      u64,
  pub visible:    u64,
  pub hidden:     u64,
  /// Ordered by count, largest first.
  pub categories: Vec<CategoryCount>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the backend fact table.
///
/// Ids and `date_added` timestamps are always assigned by the store. All
/// methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait FactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn list_facts<'a>(
    &'a self,
    query: &'a FactQuery,
  ) -> impl Future<Output = Result<Vec<Fact>, Self::Error>> + Send + 'a;

  /// Retrieve a fact by id. Returns `None` if not found.
  fn get_fact<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Fact>, Self::Error>> + Send + 'a;

  fn add_fact(
    &self,
    input: NewFact,
  ) -> impl Future<Output = Result<Fact, Self::Error>> + Send + '_;

  /// Insert many facts in a single transaction. Returns the number inserted.
  fn add_facts(
    &self,
    inputs: Vec<NewFact>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Replace the mutable fields of a fact, keeping its id and `date_added`.
  /// Returns `None` if the fact does not exist.
  fn update_fact<'a>(
    &'a self,
    id: &'a str,
    update: FactUpdate,
  ) -> impl Future<Output = Result<Option<Fact>, Self::Error>> + Send + 'a;

  /// Returns whether a row was deleted.
  fn delete_fact<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn stats(&self) -> impl Future<Output = Result<FactStats, Self::Error>> + Send + '_;
}
