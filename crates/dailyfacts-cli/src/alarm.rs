//! Timer implementations for the agent.

use std::{
  collections::HashMap,
  sync::{Mutex, PoisonError},
  time::Duration as StdDuration,
};

use chrono::{DateTime, Duration, Utc};
use dailyfacts_core::collab::Timer;
use tokio::{sync::mpsc, task::JoinHandle};

/// A trigger firing, delivered on the daemon's channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired {
  pub name: String,
  pub at:   DateTime<Utc>,
}

// ─── TokioTimer ───────────────────────────────────────────────────────────────

/// Named recurring triggers backed by tokio tasks.
///
/// Each trigger is one task that sleeps until its first fire, then once per
/// period. Scheduling an existing name aborts the old task.
pub struct TokioTimer {
  tx:    mpsc::UnboundedSender<Fired>,
  tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TokioTimer {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<Fired>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx, tasks: Mutex::new(HashMap::new()) }, rx)
  }

  /// Names with a live task.
  pub fn active(&self) -> Vec<String> {
    let tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
    let mut names: Vec<_> = tasks
      .iter()
      .filter(|(_, handle)| !handle.is_finished())
      .map(|(name, _)| name.clone())
      .collect();
    names.sort();
    names
  }
}

impl Timer for TokioTimer {
  fn schedule(&self, name: &str, first_fire: DateTime<Utc>, period: Duration) {
    let tx = self.tx.clone();
    let owned = name.to_owned();
    let delay = (first_fire - Utc::now()).to_std().unwrap_or(StdDuration::ZERO);
    let period = period.to_std().ok().filter(|p| !p.is_zero());

    let handle = tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      loop {
        let fired = Fired { name: owned.clone(), at: Utc::now() };
        if tx.send(fired).is_err() {
          break;
        }
        let Some(period) = period else { break };
        tokio::time::sleep(period).await;
      }
    });

    tracing::debug!(name, %first_fire, "trigger scheduled");
    let previous = self
      .tasks
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(name.to_owned(), handle);
    if let Some(previous) = previous {
      previous.abort();
    }
  }
}

impl Drop for TokioTimer {
  fn drop(&mut self) {
    let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
    for (_, handle) in tasks.drain() {
      handle.abort();
    }
  }
}

// ─── Detached ────────────────────────────────────────────────────────────────

/// Timer for one-shot commands. The running daemon owns the real trigger and
/// picks up setting changes on its next poll.
pub struct Detached;

impl Timer for Detached {
  fn schedule(&self, name: &str, first_fire: DateTime<Utc>, _period: Duration) {
    tracing::debug!(name, %first_fire, "trigger left to the daemon");
  }
}

#[cfg(test)]
mod tests {
  use tokio::time::timeout;

  use super::*;

  const SHORT: StdDuration = StdDuration::from_millis(200);

  #[tokio::test]
  async fn due_trigger_fires_on_the_channel() {
    let (timer, mut rx) = TokioTimer::new();
    timer.schedule("dailyFact", Utc::now(), Duration::hours(24));

    let fired = timeout(SHORT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(fired.name, "dailyFact");
    assert_eq!(timer.active(), vec!["dailyFact".to_string()]);
  }

  #[tokio::test]
  async fn rescheduling_replaces_the_old_trigger() {
    let (timer, mut rx) = TokioTimer::new();
    timer.schedule("dailyFact", Utc::now() + Duration::hours(1), Duration::hours(24));
    timer.schedule("dailyFact", Utc::now(), Duration::hours(24));

    assert!(timeout(SHORT, rx.recv()).await.unwrap().is_some());
    // The replaced trigger is gone and the new one waits a full period.
    assert!(timeout(SHORT, rx.recv()).await.is_err());
    assert_eq!(timer.active().len(), 1);
  }

  #[tokio::test]
  async fn past_first_fire_fires_immediately() {
    let (timer, mut rx) = TokioTimer::new();
    timer.schedule("late", Utc::now() - Duration::minutes(5), Duration::hours(24));
    assert_eq!(timeout(SHORT, rx.recv()).await.unwrap().unwrap().name, "late");
  }
}
