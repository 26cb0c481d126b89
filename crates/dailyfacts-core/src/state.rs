//! Per-user state kept by the delivery agent.
//!
//! [`UserState`] is threaded explicitly through the quota, selector and pause
//! operations; the only place it crosses into persistence is
//! [`crate::storage::StateStore`].

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, fact::CategorySelection, fact::Fact, pause::PauseState};

// ─── Notification time ───────────────────────────────────────────────────────

/// A wall-clock time of day in `HH:MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NotificationTime {
  hour:   u32,
  minute: u32,
}

impl NotificationTime {
  pub fn new(hour: u32, minute: u32) -> Result<Self> {
    if hour > 23 || minute > 59 {
      return Err(Error::InvalidNotificationTime(format!("{hour}:{minute}")));
    }
    Ok(Self { hour, minute })
  }

  pub fn hour(self) -> u32 { self.hour }

  pub fn minute(self) -> u32 { self.minute }

  pub fn as_naive(self) -> NaiveTime {
    NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
  }
}

impl Default for NotificationTime {
  fn default() -> Self { Self { hour: 9, minute: 0 } }
}

impl FromStr for NotificationTime {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidNotificationTime(s.to_owned());
    let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
    let digits = |part: &str| {
      (!part.is_empty()
        && part.len() <= 2
        && part.bytes().all(|b| b.is_ascii_digit()))
      .then(|| part.parse::<u32>().ok())
      .flatten()
    };
    let hour = digits(h).ok_or_else(invalid)?;
    let minute = digits(m).ok_or_else(invalid)?;
    Self::new(hour, minute).map_err(|_| invalid())
  }
}

impl fmt::Display for NotificationTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}:{:02}", self.hour, self.minute)
  }
}

impl TryFrom<String> for NotificationTime {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { value.parse() }
}

impl From<NotificationTime> for String {
  fn from(t: NotificationTime) -> Self { t.to_string() }
}

// ─── Tier ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
  Free,
  Premium,
}

impl fmt::Display for Tier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Free => f.write_str("Free Tier"),
      Self::Premium => f.write_str("Premium"),
    }
  }
}

// ─── UserState ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserState {
  pub premium:             bool,
  pub daily_count:         u32,
  pub last_reset_date:     NaiveDate,
  pub selected_categories: CategorySelection,
  pub notification_time:   NotificationTime,
  pub pause:               Option<PauseState>,
}

impl UserState {
  /// The state written on first install.
  pub fn fresh(today: NaiveDate) -> Self {
    Self {
      premium:             false,
      daily_count:         0,
      last_reset_date:     today,
      selected_categories: CategorySelection::All,
      notification_time:   NotificationTime::default(),
      pause:               None,
    }
  }

  pub fn tier(&self) -> Tier {
    if self.premium { Tier::Premium } else { Tier::Free }
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

/// One fact shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactHistoryEntry {
  pub fact_id:   String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub timestamp: DateTime<Utc>,
}

impl FactHistoryEntry {
  pub fn new(fact_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
    Self { fact_id: fact_id.into(), timestamp }
  }
}

// ─── Saved facts ─────────────────────────────────────────────────────────────

/// A fact the user explicitly kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFact {
  #[serde(flatten)]
  pub fact:     Fact,
  pub saved_at: DateTime<Utc>,
}
