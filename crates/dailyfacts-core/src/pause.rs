//! Notification pause controller.
//!
//! A pause only ever gates the scheduled trigger; manual fetches and browsing
//! keep working while paused. Expiry is lazy: a stored pause whose `until`
//! has passed simply stops counting as paused.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, schedule::local_instant, state::UserState};

/// Epoch-millisecond sentinel persisted for an indefinite pause.
pub const INDEFINITE_SENTINEL_MS: i64 = 9_007_199_254_740_991;

/// Local wall-clock time a "pause until tomorrow" ends at.
const TOMORROW_RESUME_HOUR: u32 = 9;

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseRequest {
  /// Until 09:00 local on the next calendar day.
  Tomorrow,
  /// Until explicitly resumed.
  Manual,
  /// For a fixed, positive duration.
  Timed(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseReason {
  Tomorrow,
  Manual,
  Timed,
}

// ─── PauseUntil ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseUntil {
  Indefinite,
  At(DateTime<Utc>),
}

impl PauseUntil {
  pub fn is_after(self, now: DateTime<Utc>) -> bool {
    match self {
      Self::Indefinite => true,
      Self::At(until) => until > now,
    }
  }
}

impl From<PauseUntil> for i64 {
  fn from(until: PauseUntil) -> Self {
    match until {
      PauseUntil::Indefinite => INDEFINITE_SENTINEL_MS,
      PauseUntil::At(at) => at.timestamp_millis(),
    }
  }
}

impl TryFrom<i64> for PauseUntil {
  type Error = String;

  fn try_from(ms: i64) -> Result<Self, Self::Error> {
    if ms >= INDEFINITE_SENTINEL_MS {
      return Ok(Self::Indefinite);
    }
    DateTime::from_timestamp_millis(ms)
      .map(Self::At)
      .ok_or_else(|| format!("pause timestamp out of range: {ms}"))
  }
}

impl Serialize for PauseUntil {
  fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(i64::from(*self))
  }
}

impl<'de> Deserialize<'de> for PauseUntil {
  fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    // Older records may carry the sentinel as a float.
    let ms = f64::deserialize(d)?;
    PauseUntil::try_from(ms as i64).map_err(serde::de::Error::custom)
  }
}

// ─── PauseState ──────────────────────────────────────────────────────────────

/// The persisted `notificationsPaused` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseState {
  pub until:     PauseUntil,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub paused_at: DateTime<Utc>,
  pub reason:    PauseReason,
}

/// Build the pause record for `request` issued at `now`.
///
/// `now` carries the user's time zone, which decides what "tomorrow at 9"
/// means.
pub fn pause<Tz: TimeZone>(
  request: PauseRequest,
  now: &DateTime<Tz>,
) -> Result<PauseState> {
  let paused_at = now.with_timezone(&Utc);
  let (until, reason) = match request {
    PauseRequest::Manual => (PauseUntil::Indefinite, PauseReason::Manual),
    PauseRequest::Timed(duration) => {
      if duration <= Duration::zero() {
        return Err(Error::InvalidPauseDuration);
      }
      let until = paused_at
        .checked_add_signed(duration)
        .map_or(PauseUntil::Indefinite, PauseUntil::At);
      (until, PauseReason::Timed)
    }
    PauseRequest::Tomorrow => {
      let tomorrow = now.date_naive().succ_opt().unwrap_or(NaiveDate::MAX);
      let nine =
        NaiveTime::from_hms_opt(TOMORROW_RESUME_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
      let until = local_instant(&now.timezone(), tomorrow, nine).with_timezone(&Utc);
      (PauseUntil::At(until), PauseReason::Tomorrow)
    }
  };
  Ok(PauseState { until, paused_at, reason })
}

/// Whether scheduled delivery is currently suppressed.
pub fn is_paused(pause: Option<&PauseState>, now: DateTime<Utc>) -> bool {
  pause.is_some_and(|p| p.until.is_after(now))
}

/// Clear any pause, expired or not.
pub fn resume(state: &mut UserState) { state.pause = None; }

// ─── Status text ─────────────────────────────────────────────────────────────

/// Human-readable description of an active pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseStatus {
  Active,
  Indefinite,
  UntilTomorrow,
  Remaining(Duration),
}

impl PauseStatus {
  pub fn of(pause: Option<&PauseState>, now: DateTime<Utc>) -> Self {
    let Some(pause) = pause.filter(|p| p.until.is_after(now)) else {
      return Self::Active;
    };
    match (pause.reason, pause.until) {
      (_, PauseUntil::Indefinite) => Self::Indefinite,
      (PauseReason::Tomorrow, _) => Self::UntilTomorrow,
      (_, PauseUntil::At(until)) => Self::Remaining(until - now),
    }
  }
}

impl fmt::Display for PauseStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Active => f.write_str("Notifications active"),
      Self::Indefinite => {
        f.write_str("Notifications paused until you turn them back on")
      }
      Self::UntilTomorrow => {
        f.write_str("Notifications paused until tomorrow at 9 AM")
      }
      Self::Remaining(left) => {
        let minutes = left.num_minutes();
        let (hours, minutes) = (minutes / 60, minutes % 60);
        if hours > 0 {
          write!(f, "Notifications paused for {hours}h {minutes}m")
        } else {
          write!(f, "Notifications paused for {minutes}m")
        }
      }
    }
  }
}
