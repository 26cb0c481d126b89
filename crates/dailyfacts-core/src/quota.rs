//! Daily quota for free-tier users.

use chrono::NaiveDate;

use crate::state::UserState;

/// Facts per calendar day for users without premium.
pub const FREE_DAILY_LIMIT: u32 = 5;

/// Decide whether another fact may be delivered today.
///
/// A new calendar day resets the counter before the limit is checked, so the
/// first fact after midnight is always allowed. Premium users are never
/// limited and their counter is left alone.
pub fn can_deliver(state: &mut UserState, today: NaiveDate) -> bool {
  if state.premium {
    return true;
  }

  if state.last_reset_date != today {
    state.daily_count = 0;
    state.last_reset_date = today;
    return true;
  }

  state.daily_count < FREE_DAILY_LIMIT
}

/// Count one delivered fact against the free-tier quota.
pub fn record_delivery(state: &mut UserState) {
  if !state.premium {
    state.daily_count = state.daily_count.saturating_add(1);
  }
}

/// Facts still available today, or `None` when unlimited.
pub fn remaining_today(state: &UserState, today: NaiveDate) -> Option<u32> {
  if state.premium {
    return None;
  }
  if state.last_reset_date != today {
    return Some(FREE_DAILY_LIMIT);
  }
  Some(FREE_DAILY_LIMIT.saturating_sub(state.daily_count))
}
