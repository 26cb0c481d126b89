//! SQLite backend for Daily Facts.
//!
//! [`SqliteStore`] serves two roles: the backend fact table behind the REST
//! API ([`FactStore`](dailyfacts_core::store::FactStore)) and the agent's
//! local key-value state ([`KeyValueStore`](dailyfacts_core::storage::KeyValueStore)).
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
