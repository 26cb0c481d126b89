//! Command handlers and the notification daemon.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Local, Utc};
use dailyfacts_core::{
  Error, Result,
  delivery::{Background, Delivery, SettingsUpdate, Status, Upgrade},
  fact::Category,
  history::SaveOutcome,
  pause::{PauseRequest, PauseStatus},
  schedule::DAILY_ALARM,
  selector::Recency,
  state::UserState,
};
use dailyfacts_store_sqlite::SqliteStore;
use strum::IntoEnumIterator;

use crate::{
  alarm::{Detached, TokioTimer},
  client::ApiClient,
  notify::ConsoleNotifier,
};

/// How often the daemon re-reads settings.
const SETTINGS_POLL: StdDuration = StdDuration::from_secs(60);

pub type Agent = Background<SqliteStore, ApiClient, ConsoleNotifier>;

fn local(at: DateTime<Utc>) -> String {
  at.with_timezone(&Local).format("%a %Y-%m-%d %H:%M").to_string()
}

// ─── App ──────────────────────────────────────────────────────────────────────

pub struct App {
  agent: Agent,
}

impl App {
  pub fn new(agent: Agent) -> Self { Self { agent } }

  pub fn agent(&self) -> &Agent { &self.agent }

  // ── Setup ─────────────────────────────────────────────────────────────────

  pub async fn init(&self) -> Result<()> {
    let next = self.agent.install(&Detached, Utc::now()).await?;
    println!("Daily Facts is set up. Next fact: {}", local(next));
    Ok(())
  }

  // ── Facts ─────────────────────────────────────────────────────────────────

  /// Manual "get a fact". The notifier has already shown the outcome.
  pub async fn fact(&self) -> Result<Delivery> {
    let now = Utc::now();
    let outcome = self.agent.fetch_fact(now).await?;
    if let Delivery::Delivered(fact) = &outcome {
      println!("  [{}] id {}", fact.category, fact.id);
      if let Some(left) = self.agent.status(now).await?.remaining_today {
        println!("  {left} free facts left today");
      }
    }
    Ok(outcome)
  }

  pub async fn browse(&self, recycle: bool) -> Result<Delivery> {
    let recency = if recycle { Recency::Recycle } else { Recency::ExcludeRecent };
    let outcome = self.agent.browse(Utc::now(), recency).await?;
    match &outcome {
      Delivery::Delivered(fact) => {
        println!("{}", fact.text);
        let source = fact.source.as_deref().unwrap_or("unknown source");
        println!("  [{}] {source}", fact.category);
      }
      other => {
        if let Some((title, body)) = other.notification() {
          println!("{title}\n  {body}");
        }
        if matches!(other, Delivery::NoNewFacts) {
          println!("  Run `dailyfacts browse --recycle` to see older facts again.");
        }
      }
    }
    Ok(outcome)
  }

  // ── Saved facts ───────────────────────────────────────────────────────────

  pub async fn save(&self) -> Result<()> {
    match self.agent.save_current(Utc::now()).await? {
      SaveOutcome::Saved => println!("Fact saved."),
      SaveOutcome::AlreadySaved => println!("Fact already saved."),
    }
    Ok(())
  }

  pub async fn saved_list(&self) -> Result<()> {
    let saved = self.agent.saved_facts().await?;
    if saved.is_empty() {
      println!("No saved facts yet.");
    }
    for entry in saved {
      println!("{}  [{}] {}", entry.fact.id, entry.fact.category, entry.fact.text);
    }
    Ok(())
  }

  pub async fn saved_remove(&self, id: &str) -> Result<bool> {
    let removed = self.agent.remove_saved(id).await?;
    if removed {
      println!("Removed.");
    } else {
      println!("No saved fact with id {id}.");
    }
    Ok(removed)
  }

  pub async fn saved_clear(&self) -> Result<()> {
    self.agent.clear_saved().await?;
    println!("Saved facts cleared.");
    Ok(())
  }

  // ── Pause ─────────────────────────────────────────────────────────────────

  pub async fn pause(&self, request: PauseRequest) -> Result<PauseStatus> {
    let now = Utc::now();
    let record = self.agent.pause(request, now).await?;
    let status = PauseStatus::of(Some(&record), now);
    println!("{status}");
    Ok(status)
  }

  pub async fn resume(&self) -> Result<()> {
    self.agent.resume().await?;
    println!("{}", PauseStatus::Active);
    Ok(())
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  pub async fn settings(&self, update: SettingsUpdate) -> Result<UserState> {
    let now = Utc::now();
    let state = if update.categories.is_none() && update.notification_time.is_none() {
      self.agent.user_state(now).await?
    } else {
      let state = self.agent.update_settings(update, &Detached, now).await?;
      println!("Settings saved.");
      state
    };
    println!("Categories:        {}", state.selected_categories);
    println!("Notification time: {}", state.notification_time);
    Ok(state)
  }

  pub async fn categories(&self) -> Result<()> {
    let state = self.agent.user_state(Utc::now()).await?;
    for category in Category::iter() {
      let mark = if state.selected_categories.includes(category) { '*' } else { ' ' };
      println!("{mark} {category}");
    }
    Ok(())
  }

  // ── Premium ───────────────────────────────────────────────────────────────

  pub async fn upgrade(&self, payment_intent_id: &str) -> Result<Upgrade> {
    let outcome = self
      .agent
      .upgrade(self.agent.source(), payment_intent_id, Utc::now())
      .await?;
    match outcome {
      Upgrade::Activated => println!("Premium activated. Enjoy unlimited facts!"),
      Upgrade::AlreadyApplied => println!("This payment already activated Premium."),
    }
    Ok(outcome)
  }

  // ── Status ────────────────────────────────────────────────────────────────

  pub async fn status(&self) -> Result<Status> {
    let status = self.agent.status(Utc::now()).await?;
    println!("Plan:              {}", status.tier);
    match status.remaining_today {
      Some(left) => println!("Facts left today:  {left}"),
      None => println!("Facts left today:  unlimited"),
    }
    println!("Notifications:     {}", status.pause);
    println!("Notification time: {}", status.notification_time);
    println!("Next fact:         {}", local(status.next_fire));
    println!("Categories:        {}", status.categories);
    println!("Shown today:       {}", status.shown_today);
    println!("Shown in total:    {}", status.total_shown);
    println!("Saved facts:       {}", status.saved);
    Ok(status)
  }

  // ── Daemon ────────────────────────────────────────────────────────────────

  /// Run until Ctrl-C: deliver on each trigger firing and re-register the
  /// trigger when the stored notification time changes.
  pub async fn run(&self) -> Result<()> {
    let (timer, mut fired) = TokioTimer::new();
    let now = Utc::now();
    let next = self.agent.install(&timer, now).await?;
    let mut time = self.agent.user_state(now).await?.notification_time;
    tracing::info!(next = %local(next), "daemon started");
    println!("Waiting for the next fact at {}. Press Ctrl-C to stop.", local(next));

    let mut poll = tokio::time::interval(SETTINGS_POLL);
    poll.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
      tokio::select! {
        Some(event) = fired.recv() => {
          if event.name != DAILY_ALARM {
            continue;
          }
          match self.agent.deliver_scheduled(event.at).await {
            Ok(outcome) => tracing::debug!(?outcome, "scheduled delivery"),
            Err(e) => tracing::error!(error = %e, "scheduled delivery failed"),
          }
        }
        _ = poll.tick() => {
          match self.agent.follow_notification_time(&timer, &mut time, Utc::now()).await {
            Ok(Some(next)) => {
              tracing::info!(%time, next = %local(next), "notification time changed");
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to poll settings"),
          }
        }
        _ = &mut shutdown => {
          tracing::info!("shutting down");
          break;
        }
      }
    }
    Ok(())
  }
}

/// Turn `--minutes N` into a timed pause request. Values chrono cannot
/// represent are rejected instead of panicking.
pub fn timed_pause(minutes: i64) -> Result<PauseRequest> {
  Duration::try_minutes(minutes)
    .map(PauseRequest::Timed)
    .ok_or(Error::InvalidPauseDuration)
}
