//! The delivery agent: ties quota, selection, pause and scheduling to the
//! collaborators and the persisted state.
//!
//! Every operation takes the current instant explicitly. The agent's time
//! zone decides calendar days and wall-clock times.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
  Error, Result,
  collab::{FactSource, Notifier, PaymentProvider, Timer},
  fact::{CategorySelection, Fact},
  history::{self, SaveOutcome},
  pause::{self, PauseRequest, PauseState, PauseStatus},
  quota,
  schedule,
  selector::{self, Pick, Recency},
  state::{FactHistoryEntry, NotificationTime, SavedFact, Tier, UserState},
  storage::{KeyValueStore, StateStore},
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What a delivery attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
  Delivered(Fact),
  /// The scheduled trigger fired while notifications were paused.
  Paused,
  LimitReached,
  /// The pool returned no visible facts.
  NoFacts,
  /// Every eligible fact was shown within the recency window.
  NoNewFacts,
  /// The pool could not be reached.
  Unavailable,
}

impl Delivery {
  /// Title and body of the notification raised for this outcome.
  pub fn notification(&self) -> Option<(&str, &str)> {
    match self {
      Self::Delivered(fact) => Some(("Daily Fact", fact.text.as_str())),
      Self::Paused => None,
      Self::LimitReached => {
        Some(("Daily Limit Reached", "Upgrade to Premium for unlimited facts!"))
      }
      Self::NoFacts => Some(("No Facts Available", "Please try again later.")),
      Self::NoNewFacts => Some((
        "No New Facts",
        "You have seen every available fact recently. Recycle older facts to keep going.",
      )),
      Self::Unavailable => {
        Some(("Error", "Failed to fetch fact. Please check your connection."))
      }
    }
  }

  pub fn fact(&self) -> Option<&Fact> {
    match self {
      Self::Delivered(fact) => Some(fact),
      _ => None,
    }
  }
}

/// Result of a premium upgrade attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upgrade {
  Activated,
  /// This payment already granted premium.
  AlreadyApplied,
}

/// Requested settings changes. `None` leaves a setting unchanged.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
  pub categories:        Option<Vec<String>>,
  pub notification_time: Option<String>,
}

/// A snapshot for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
  pub tier:              Tier,
  /// `None` for unlimited.
  pub remaining_today:   Option<u32>,
  pub pause:             PauseStatus,
  pub notification_time: NotificationTime,
  pub categories:        CategorySelection,
  pub next_fire:         DateTime<Utc>,
  pub shown_today:       usize,
  pub total_shown:       usize,
  pub saved:             usize,
}

// ─── Agent ───────────────────────────────────────────────────────────────────

pub struct Background<K, F, N, Tz = Local> {
  state:    StateStore<K>,
  source:   F,
  notifier: N,
  tz:       Tz,
  rng:      Mutex<StdRng>,
}

impl<K, F, N, Tz> Background<K, F, N, Tz>
where
  K: KeyValueStore,
  F: FactSource,
  N: Notifier,
  Tz: TimeZone + Send + Sync,
{
  pub fn new(kv: K, source: F, notifier: N, tz: Tz) -> Self {
    Self {
      state: StateStore::new(kv),
      source,
      notifier,
      tz,
      rng: Mutex::new(StdRng::from_entropy()),
    }
  }

  /// Replace the random source, e.g. with a seeded one.
  pub fn with_rng(mut self, rng: StdRng) -> Self {
    self.rng = Mutex::new(rng);
    self
  }

  pub fn store(&self) -> &StateStore<K> { &self.state }

  pub fn source(&self) -> &F { &self.source }

  fn today(&self, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&self.tz).date_naive()
  }

  fn rng(&self) -> std::sync::MutexGuard<'_, StdRng> {
    self.rng.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn announce(&self, outcome: &Delivery) {
    if let Some((title, body)) = outcome.notification() {
      self.notifier.show(title, body);
    }
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Write first-install defaults for missing keys and register the daily
  /// trigger.
  pub async fn install<T: Timer + ?Sized>(
    &self,
    timer: &T,
    now: DateTime<Utc>,
  ) -> Result<DateTime<Utc>> {
    self.state.install_defaults(self.today(now)).await?;
    self.schedule_alarm(timer, now).await
  }

  pub async fn user_state(&self, now: DateTime<Utc>) -> Result<UserState> {
    self.state.load_user_state(self.today(now)).await
  }

  /// (Re)register the daily trigger at the stored notification time.
  pub async fn schedule_alarm<T: Timer + ?Sized>(
    &self,
    timer: &T,
    now: DateTime<Utc>,
  ) -> Result<DateTime<Utc>> {
    let state = self.user_state(now).await?;
    Ok(schedule::reschedule(
      timer,
      state.notification_time,
      &now.with_timezone(&self.tz),
    ))
  }

  /// Re-register the daily trigger if the stored notification time moved
  /// away from `known`. `known` only advances once the trigger is replaced,
  /// so a failed attempt is retried on the next call.
  pub async fn follow_notification_time<T: Timer + ?Sized>(
    &self,
    timer: &T,
    known: &mut NotificationTime,
    now: DateTime<Utc>,
  ) -> Result<Option<DateTime<Utc>>> {
    let stored = self.user_state(now).await?.notification_time;
    if stored == *known {
      return Ok(None);
    }
    let next = self.schedule_alarm(timer, now).await?;
    *known = stored;
    Ok(Some(next))
  }

  // ── Delivery ──────────────────────────────────────────────────────────

  /// Apply the quota check, persisting a day rollover if one happened.
  async fn check_quota(&self, state: &mut UserState, today: NaiveDate) -> Result<bool> {
    let before = (state.daily_count, state.last_reset_date);
    let allowed = quota::can_deliver(state, today);
    if (state.daily_count, state.last_reset_date) != before {
      self.state.save_quota(state).await?;
    }
    Ok(allowed)
  }

  /// Count a delivery against the free-tier quota.
  async fn count(&self, mut state: UserState) -> Result<()> {
    quota::record_delivery(&mut state);
    if state.premium {
      return Ok(());
    }
    self.state.save_quota(&state).await
  }

  /// Append the fact to history and remember it as the current fact.
  async fn remember(&self, fact: &Fact, now: DateTime<Utc>) -> Result<()> {
    self
      .state
      .append_history(FactHistoryEntry::new(fact.id.clone(), now))
      .await?;
    self.state.set_current_fact(fact).await
  }

  async fn fetch_pool(&self) -> Option<Vec<Fact>> {
    match self.source.fetch(None, None).await {
      Ok(pool) => Some(pool),
      Err(e) => {
        tracing::warn!(error = %e, "fact pool unavailable");
        None
      }
    }
  }

  /// Handle a firing of the daily trigger.
  ///
  /// Nothing happens while paused. Otherwise the whole pool is fetched and a
  /// fact not shown within the recency window is delivered.
  pub async fn deliver_scheduled(&self, now: DateTime<Utc>) -> Result<Delivery> {
    let today = self.today(now);
    let mut state = self.state.load_user_state(today).await?;

    if pause::is_paused(state.pause.as_ref(), now) {
      tracing::debug!("notifications paused, skipping scheduled delivery");
      return Ok(Delivery::Paused);
    }

    let outcome = if !self.check_quota(&mut state, today).await? {
      tracing::info!(count = state.daily_count, "daily limit reached");
      Delivery::LimitReached
    } else {
      match self.fetch_pool().await {
        None => Delivery::Unavailable,
        Some(pool) => {
          let outcome = self.pick_from(&pool, &state, now, Recency::ExcludeRecent).await?;
          if let Delivery::Delivered(fact) = &outcome {
            self.remember(fact, now).await?;
            self.count(state).await?;
            tracing::info!(fact_id = %fact.id, category = %fact.category, "delivered fact");
          }
          outcome
        }
      }
    };

    self.announce(&outcome);
    Ok(outcome)
  }

  /// Popup-style selection: recency-filtered, never counted against the
  /// quota and never announced.
  pub async fn browse(&self, now: DateTime<Utc>, recency: Recency) -> Result<Delivery> {
    let state = self.user_state(now).await?;
    let Some(pool) = self.fetch_pool().await else {
      return Ok(Delivery::Unavailable);
    };
    let outcome = self.pick_from(&pool, &state, now, recency).await?;
    if let Delivery::Delivered(fact) = &outcome {
      self.remember(fact, now).await?;
    }
    Ok(outcome)
  }

  async fn pick_from(
    &self,
    pool: &[Fact],
    state: &UserState,
    now: DateTime<Utc>,
    recency: Recency,
  ) -> Result<Delivery> {
    if pool.iter().all(|f| f.hidden) {
      return Ok(Delivery::NoFacts);
    }
    let history = self.state.history().await?;
    let picked = {
      let mut rng = self.rng();
      match selector::pick(pool, &history, state, now, recency, &mut *rng) {
        Pick::Fact(fact) => Some(fact.clone()),
        Pick::NoNewFacts => None,
      }
    };
    Ok(picked.map_or(Delivery::NoNewFacts, Delivery::Delivered))
  }

  /// The user's "get a fact" action.
  ///
  /// Draws one random fact from a random selected category straight from the
  /// pool. The quota applies but pause and recency filtering do not.
  pub async fn fetch_fact(&self, now: DateTime<Utc>) -> Result<Delivery> {
    let today = self.today(now);
    let mut state = self.state.load_user_state(today).await?;

    let outcome = if !self.check_quota(&mut state, today).await? {
      tracing::info!(count = state.daily_count, "daily limit reached");
      Delivery::LimitReached
    } else {
      let category = state.selected_categories.pick_query(&mut *self.rng());
      match self.source.fetch(category, Some(1)).await {
        Err(e) => {
          tracing::warn!(error = %e, ?category, "fact fetch failed");
          Delivery::Unavailable
        }
        Ok(facts) => match facts.into_iter().find(|f| !f.hidden) {
          None => Delivery::NoFacts,
          Some(fact) => {
            self.remember(&fact, now).await?;
            self.count(state).await?;
            tracing::info!(fact_id = %fact.id, "delivered requested fact");
            Delivery::Delivered(fact)
          }
        },
      }
    };

    self.announce(&outcome);
    Ok(outcome)
  }

  // ── Saved facts ───────────────────────────────────────────────────────

  /// Save the fact most recently shown.
  pub async fn save_current(&self, now: DateTime<Utc>) -> Result<SaveOutcome> {
    let fact = self.state.current_fact().await?.ok_or(Error::NoCurrentFact)?;
    self.save(&fact, now).await
  }

  pub async fn save(&self, fact: &Fact, now: DateTime<Utc>) -> Result<SaveOutcome> {
    let mut saved = self.state.saved_facts().await?;
    let outcome = history::save_fact(&mut saved, fact, now);
    if outcome == SaveOutcome::Saved {
      self.state.write_saved(&saved).await?;
    }
    Ok(outcome)
  }

  pub async fn saved_facts(&self) -> Result<Vec<SavedFact>> { self.state.saved_facts().await }

  pub async fn remove_saved(&self, fact_id: &str) -> Result<bool> {
    let mut saved = self.state.saved_facts().await?;
    let removed = history::remove_saved(&mut saved, fact_id);
    if removed {
      self.state.write_saved(&saved).await?;
    }
    Ok(removed)
  }

  pub async fn clear_saved(&self) -> Result<()> { self.state.write_saved(&[]).await }

  pub async fn history(&self) -> Result<Vec<FactHistoryEntry>> { self.state.history().await }

  // ── Pause ─────────────────────────────────────────────────────────────

  pub async fn pause(&self, request: PauseRequest, now: DateTime<Utc>) -> Result<PauseState> {
    let record = pause::pause(request, &now.with_timezone(&self.tz))?;
    self.state.set_pause(&record).await?;
    tracing::info!(reason = ?record.reason, "notifications paused");
    Ok(record)
  }

  pub async fn resume(&self) -> Result<()> {
    self.state.clear_pause().await?;
    tracing::info!("notifications resumed");
    Ok(())
  }

  pub async fn pause_status(&self, now: DateTime<Utc>) -> Result<PauseStatus> {
    let state = self.user_state(now).await?;
    Ok(PauseStatus::of(state.pause.as_ref(), now))
  }

  // ── Settings ──────────────────────────────────────────────────────────

  /// Validate and persist settings, then re-register the daily trigger.
  /// Nothing is written if any value is invalid.
  pub async fn update_settings<T: Timer + ?Sized>(
    &self,
    update: SettingsUpdate,
    timer: &T,
    now: DateTime<Utc>,
  ) -> Result<UserState> {
    let mut state = self.user_state(now).await?;

    if let Some(names) = &update.categories {
      state.selected_categories = CategorySelection::from_names(names)?;
    }
    if let Some(time) = &update.notification_time {
      state.notification_time = time.parse()?;
    }

    self
      .state
      .save_settings(&state.selected_categories, state.notification_time)
      .await?;
    schedule::reschedule(timer, state.notification_time, &now.with_timezone(&self.tz));
    tracing::info!(
      categories = %state.selected_categories,
      time = %state.notification_time,
      "settings updated"
    );
    Ok(state)
  }

  // ── Premium ───────────────────────────────────────────────────────────

  pub async fn set_premium(&self, premium: bool) -> Result<()> {
    self.state.set_premium(premium, None).await
  }

  /// Verify a payment with the provider and grant premium on success.
  /// Re-applying a payment that already granted premium is a no-op.
  pub async fn upgrade<P: PaymentProvider>(
    &self,
    provider: &P,
    payment_intent_id: &str,
    now: DateTime<Utc>,
  ) -> Result<Upgrade> {
    let id = payment_intent_id.trim();
    if id.is_empty() {
      return Err(Error::MissingPaymentId);
    }

    let state = self.user_state(now).await?;
    if state.premium && self.state.premium_payment_id().await?.as_deref() == Some(id) {
      return Ok(Upgrade::AlreadyApplied);
    }

    let intent = provider
      .retrieve(id)
      .await
      .map_err(|e| Error::Payment(Box::new(e)))?;
    if !intent.succeeded() {
      tracing::warn!(payment_intent = id, status = %intent.status, "payment not completed");
      return Err(Error::PaymentNotSucceeded { id: id.to_owned(), status: intent.status });
    }

    self.state.set_premium(true, Some(id)).await?;
    tracing::info!(payment_intent = id, "premium activated");
    Ok(Upgrade::Activated)
  }

  // ── Status ────────────────────────────────────────────────────────────

  pub async fn status(&self, now: DateTime<Utc>) -> Result<Status> {
    let today = self.today(now);
    let state = self.state.load_user_state(today).await?;
    let history = self.state.history().await?;
    let saved = self.state.saved_facts().await?.len();

    Ok(Status {
      tier: state.tier(),
      remaining_today: quota::remaining_today(&state, today),
      pause: PauseStatus::of(state.pause.as_ref(), now),
      notification_time: state.notification_time,
      next_fire: schedule::next_fire_time(
        state.notification_time,
        &now.with_timezone(&self.tz),
      )
      .with_timezone(&Utc),
      categories: state.selected_categories,
      shown_today: history::shown_on(&history, &self.tz, today),
      total_shown: history.len(),
      saved,
    })
  }
}
