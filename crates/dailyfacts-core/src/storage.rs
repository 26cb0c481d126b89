//! Persistence of the agent's local state.
//!
//! [`KeyValueStore`] is the raw JSON key-value collaborator. [`StateStore`]
//! is the only adapter that crosses from typed state into it; every other
//! module works on plain values.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
  Error, Result,
  fact::{CategorySelection, Fact},
  pause::PauseState,
  state::{FactHistoryEntry, NotificationTime, SavedFact, UserState},
};

/// Storage key names, the same names earlier releases used. Only the names
/// carry over: values must be in the formats written here (dates as
/// `YYYY-MM-DD`).
pub mod keys {
  pub const PREMIUM_STATUS: &str = "premiumStatus";
  pub const DAILY_FACT_COUNT: &str = "dailyFactCount";
  pub const LAST_RESET_DATE: &str = "lastResetDate";
  pub const SELECTED_CATEGORIES: &str = "selectedCategories";
  pub const NOTIFICATION_TIME: &str = "notificationTime";
  pub const SAVED_FACTS: &str = "savedFacts";
  pub const NOTIFICATIONS_PAUSED: &str = "notificationsPaused";
  pub const FACT_HISTORY: &str = "factHistory";
  pub const CURRENT_FACT: &str = "currentFact";
  pub const PREMIUM_PAYMENT_ID: &str = "premiumPaymentId";
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A flat map of JSON values keyed by name.
pub trait KeyValueStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the stored values for `keys`. Missing keys are absent from the
  /// returned map.
  fn get<'a>(
    &'a self,
    keys: &'a [&'a str],
  ) -> impl Future<Output = Result<Map<String, Value>, Self::Error>> + Send + 'a;

  /// Write every entry of `values`, replacing existing ones.
  fn set(
    &self,
    values: Map<String, Value>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn remove<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

fn storage<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Storage(Box::new(e))
}

// ─── Adapter ─────────────────────────────────────────────────────────────────

/// Typed access to the agent state held in a [`KeyValueStore`].
pub struct StateStore<K> {
  kv: K,
}

impl<K: KeyValueStore> StateStore<K> {
  pub fn new(kv: K) -> Self { Self { kv } }

  pub fn inner(&self) -> &K { &self.kv }

  async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    let mut values = self.kv.get(&[key]).await.map_err(storage)?;
    match values.remove(key) {
      None | Some(Value::Null) => Ok(None),
      Some(v) => Ok(Some(serde_json::from_value(v)?)),
    }
  }

  async fn write(&self, entries: Vec<(&str, Value)>) -> Result<()> {
    let values = entries
      .into_iter()
      .map(|(k, v)| (k.to_owned(), v))
      .collect::<Map<_, _>>();
    self.kv.set(values).await.map_err(storage)
  }

  fn json<T: Serialize>(value: &T) -> Result<Value> { Ok(serde_json::to_value(value)?) }

  /// Write defaults for every key that is not yet present. Existing values
  /// are left untouched, so re-running this on update is harmless.
  pub async fn install_defaults(&self, today: NaiveDate) -> Result<()> {
    let fresh = UserState::fresh(today);
    let defaults = [
      (keys::PREMIUM_STATUS, Self::json(&fresh.premium)?),
      (keys::DAILY_FACT_COUNT, Self::json(&fresh.daily_count)?),
      (keys::LAST_RESET_DATE, Self::json(&fresh.last_reset_date)?),
      (keys::SELECTED_CATEGORIES, Self::json(&fresh.selected_categories)?),
      (keys::NOTIFICATION_TIME, Self::json(&fresh.notification_time)?),
      (keys::SAVED_FACTS, Value::Array(Vec::new())),
      (keys::FACT_HISTORY, Value::Array(Vec::new())),
    ];

    let names: Vec<&str> = defaults.iter().map(|(k, _)| *k).collect();
    let existing = self.kv.get(&names).await.map_err(storage)?;

    let missing: Vec<(&str, Value)> = defaults
      .into_iter()
      .filter(|(k, _)| !existing.contains_key(*k))
      .collect();
    if missing.is_empty() {
      return Ok(());
    }

    tracing::info!(keys = ?missing.iter().map(|(k, _)| *k).collect::<Vec<_>>(), "installing default state");
    self.write(missing).await
  }

  /// Load the user state, falling back to first-install defaults for any
  /// missing key.
  pub async fn load_user_state(&self, today: NaiveDate) -> Result<UserState> {
    let wanted = [
      keys::PREMIUM_STATUS,
      keys::DAILY_FACT_COUNT,
      keys::LAST_RESET_DATE,
      keys::SELECTED_CATEGORIES,
      keys::NOTIFICATION_TIME,
      keys::NOTIFICATIONS_PAUSED,
    ];
    let mut values = self.kv.get(&wanted).await.map_err(storage)?;
    let mut take = |key: &str| values.remove(key).filter(|v| !v.is_null());

    let fresh = UserState::fresh(today);
    Ok(UserState {
      premium:             decode_or(take(keys::PREMIUM_STATUS), fresh.premium)?,
      daily_count:         decode_or(take(keys::DAILY_FACT_COUNT), fresh.daily_count)?,
      last_reset_date:     decode_or(take(keys::LAST_RESET_DATE), fresh.last_reset_date)?,
      selected_categories: decode_or(
        take(keys::SELECTED_CATEGORIES),
        fresh.selected_categories,
      )?,
      notification_time:   decode_or(
        take(keys::NOTIFICATION_TIME),
        fresh.notification_time,
      )?,
      pause:               take(keys::NOTIFICATIONS_PAUSED)
        .map(serde_json::from_value)
        .transpose()?,
    })
  }

  /// Persist the counter and reset date.
  pub async fn save_quota(&self, state: &UserState) -> Result<()> {
    self
      .write(vec![
        (keys::DAILY_FACT_COUNT, Self::json(&state.daily_count)?),
        (keys::LAST_RESET_DATE, Self::json(&state.last_reset_date)?),
      ])
      .await
  }

  pub async fn save_settings(
    &self,
    categories: &CategorySelection,
    time: NotificationTime,
  ) -> Result<()> {
    self
      .write(vec![
        (keys::SELECTED_CATEGORIES, Self::json(categories)?),
        (keys::NOTIFICATION_TIME, Self::json(&time)?),
      ])
      .await
  }

  /// Set the premium flag, recording the payment that granted it.
  pub async fn set_premium(&self, premium: bool, payment_id: Option<&str>) -> Result<()> {
    let mut entries = vec![(keys::PREMIUM_STATUS, Value::Bool(premium))];
    if let Some(id) = payment_id {
      entries.push((keys::PREMIUM_PAYMENT_ID, Value::String(id.to_owned())));
    }
    self.write(entries).await
  }

  pub async fn premium_payment_id(&self) -> Result<Option<String>> {
    self.read(keys::PREMIUM_PAYMENT_ID).await
  }

  pub async fn set_pause(&self, pause: &PauseState) -> Result<()> {
    self
      .write(vec![(keys::NOTIFICATIONS_PAUSED, Self::json(pause)?)])
      .await
  }

  pub async fn clear_pause(&self) -> Result<()> {
    self.kv.remove(keys::NOTIFICATIONS_PAUSED).await.map_err(storage)
  }

  pub async fn history(&self) -> Result<Vec<FactHistoryEntry>> {
    Ok(self.read(keys::FACT_HISTORY).await?.unwrap_or_default())
  }

  pub async fn write_history(&self, history: &[FactHistoryEntry]) -> Result<()> {
    self.write(vec![(keys::FACT_HISTORY, Self::json(&history)?)]).await
  }

  /// Read the whole history, append one entry, write it back.
  pub async fn append_history(&self, entry: FactHistoryEntry) -> Result<()> {
    let history = crate::history::append_history(self.history().await?, entry);
    self.write_history(&history).await
  }

  pub async fn saved_facts(&self) -> Result<Vec<SavedFact>> {
    Ok(self.read(keys::SAVED_FACTS).await?.unwrap_or_default())
  }

  pub async fn write_saved(&self, saved: &[SavedFact]) -> Result<()> {
    self.write(vec![(keys::SAVED_FACTS, Self::json(&saved)?)]).await
  }

  /// The fact most recently displayed to the user.
  pub async fn current_fact(&self) -> Result<Option<Fact>> {
    self.read(keys::CURRENT_FACT).await
  }

  pub async fn set_current_fact(&self, fact: &Fact) -> Result<()> {
    self.write(vec![(keys::CURRENT_FACT, Self::json(fact)?)]).await
  }
}

fn decode_or<T: DeserializeOwned>(value: Option<Value>, default: T) -> Result<T> {
  match value {
    Some(v) => Ok(serde_json::from_value(v)?),
    None => Ok(default),
  }
}
