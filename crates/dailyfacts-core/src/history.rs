//! Pure operations over the fact history and the saved-facts list.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::{
  fact::Fact,
  state::{FactHistoryEntry, SavedFact},
};

/// Append `entry`, keeping timestamps non-decreasing.
///
/// An entry older than the last one recorded is clamped to the last
/// timestamp, so insertion order stays chronological even if the clock moved
/// backwards between deliveries.
pub fn append_history(
  mut history: Vec<FactHistoryEntry>,
  mut entry: FactHistoryEntry,
) -> Vec<FactHistoryEntry> {
  if let Some(last) = history.last() {
    entry.timestamp = entry.timestamp.max(last.timestamp);
  }
  history.push(entry);
  history
}

/// Number of history entries that fall on `day` in the zone of `tz`.
pub fn shown_on<Tz: TimeZone>(
  history: &[FactHistoryEntry],
  tz: &Tz,
  day: NaiveDate,
) -> usize {
  history
    .iter()
    .filter(|entry| entry.timestamp.with_timezone(tz).date_naive() == day)
    .count()
}

// ─── Saved facts ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
  Saved,
  AlreadySaved,
}

/// Add `fact` to `saved` unless an entry with the same id exists.
pub fn save_fact(
  saved: &mut Vec<SavedFact>,
  fact: &Fact,
  now: DateTime<Utc>,
) -> SaveOutcome {
  if saved.iter().any(|s| s.fact.id == fact.id) {
    return SaveOutcome::AlreadySaved;
  }
  saved.push(SavedFact { fact: fact.clone(), saved_at: now });
  SaveOutcome::Saved
}

/// Remove the saved entry for `fact_id`. Returns whether one was removed.
pub fn remove_saved(saved: &mut Vec<SavedFact>, fact_id: &str) -> bool {
  let before = saved.len();
  saved.retain(|s| s.fact.id != fact_id);
  saved.len() != before
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, FixedOffset};

  use super::*;
  use crate::fact::Category;

  fn t(h: u32) -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 2, 3, h, 0, 0).unwrap() }

  fn fact(id: &str) -> Fact {
    Fact {
      id:         id.into(),
      text:       "Bananas are berries.".into(),
      category:   Category::Food,
      source:     None,
      tags:       vec![],
      date_added: t(0),
      hidden:     false,
    }
  }

  #[test]
  fn append_preserves_order_and_clamps() {
    let h = append_history(Vec::new(), FactHistoryEntry::new("a", t(10)));
    let h = append_history(h, FactHistoryEntry::new("b", t(12)));
    let h = append_history(h, FactHistoryEntry::new("c", t(11)));
    let ids: Vec<_> = h.iter().map(|e| e.fact_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert_eq!(h[2].timestamp, t(12));
    assert!(h.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
  }

  #[test]
  fn shown_on_counts_local_days() {
    let h = vec![
      FactHistoryEntry::new("a", t(1)),
      FactHistoryEntry::new("b", t(23)),
      FactHistoryEntry::new("c", t(23) + Duration::hours(2)),
    ];
    let day = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
    assert_eq!(shown_on(&h, &Utc, day), 2);
    // Two hours ahead: 23:00 UTC is already the next day.
    let east = FixedOffset::east_opt(2 * 3600).unwrap();
    assert_eq!(shown_on(&h, &east, day), 1);
  }

  #[test]
  fn saving_twice_keeps_one_entry() {
    let mut saved = Vec::new();
    assert_eq!(save_fact(&mut saved, &fact("x"), t(5)), SaveOutcome::Saved);
    assert_eq!(save_fact(&mut saved, &fact("x"), t(6)), SaveOutcome::AlreadySaved);
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].saved_at, t(5));
  }

  #[test]
  fn remove_saved_reports_whether_anything_changed() {
    let mut saved = Vec::new();
    save_fact(&mut saved, &fact("x"), t(5));
    save_fact(&mut saved, &fact("y"), t(6));
    assert!(remove_saved(&mut saved, "x"));
    assert!(!remove_saved(&mut saved, "x"));
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].fact.id, "y");
  }
}
