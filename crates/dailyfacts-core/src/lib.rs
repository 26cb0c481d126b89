//! Core types and state machines for Daily Facts.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! backend store, the REST API and the agent CLI all depend on it; the
//! collaborators it needs (fact pool, key-value storage, timer, notifier,
//! payment provider) are expressed as traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod collab;
pub mod delivery;
pub mod error;
pub mod fact;
pub mod history;
pub mod pause;
pub mod quota;
pub mod schedule;
pub mod selector;
pub mod state;
pub mod storage;
pub mod store;

pub use error::{Error, Result};
