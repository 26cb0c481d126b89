//! Daily notification scheduling.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::{collab::Timer, state::NotificationTime};

/// Name of the single recurring trigger that drives daily delivery.
pub const DAILY_ALARM: &str = "dailyFact";

/// Period of the daily trigger.
pub fn daily_period() -> Duration { Duration::hours(24) }

/// The local instant for `date` at wall-clock `time` in `tz`.
///
/// Ambiguous times (clocks going back) resolve to the earlier instant. Times
/// inside a gap (clocks going forward) resolve to the first valid local time
/// after it.
pub fn local_instant<Tz: TimeZone>(
  tz: &Tz,
  date: NaiveDate,
  time: NaiveTime,
) -> DateTime<Tz> {
  let naive = date.and_time(time);
  if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
    return dt;
  }
  (1..=180)
    .map(|minutes| naive + Duration::minutes(minutes))
    .find_map(|shifted| tz.from_local_datetime(&shifted).earliest())
    .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// When the daily trigger should first fire: today at `time` if that is
/// still in the future, otherwise the same wall-clock time tomorrow.
pub fn next_fire_time<Tz: TimeZone>(
  time: NotificationTime,
  now: &DateTime<Tz>,
) -> DateTime<Tz> {
  let tz = now.timezone();
  let today = now.date_naive();
  let candidate = local_instant(&tz, today, time.as_naive());
  if candidate > *now {
    return candidate;
  }
  let tomorrow = today.succ_opt().unwrap_or(NaiveDate::MAX);
  local_instant(&tz, tomorrow, time.as_naive())
}

/// Register (or replace) the daily trigger on `timer`. Returns the first fire
/// time.
pub fn reschedule<T, Tz>(
  timer: &T,
  time: NotificationTime,
  now: &DateTime<Tz>,
) -> DateTime<Utc>
where
  T: Timer + ?Sized,
  Tz: TimeZone,
{
  let first_fire = next_fire_time(time, now).with_timezone(&Utc);
  timer.schedule(DAILY_ALARM, first_fire, daily_period());
  tracing::debug!(%first_fire, %time, "scheduled daily fact trigger");
  first_fire
}
