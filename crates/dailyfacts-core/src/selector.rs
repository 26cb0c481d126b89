//! Fact selection with recency deduplication.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, seq::SliceRandom};

use crate::{
  fact::Fact,
  state::{FactHistoryEntry, UserState},
};

/// Lookback within which a shown fact is not shown again.
pub fn recency_window() -> Duration { Duration::days(180) }

/// Whether recently shown facts are excluded from the candidate set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Recency {
  #[default]
  ExcludeRecent,
  /// Ignore history entirely.
  Recycle,
}

/// Outcome of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick<'a> {
  Fact(&'a Fact),
  /// Every eligible fact has been shown inside the recency window.
  NoNewFacts,
}

/// Ids shown after `now - window`.
fn recently_seen(
  history: &[FactHistoryEntry],
  now: DateTime<Utc>,
) -> HashSet<&str> {
  let cutoff = now - recency_window();
  history
    .iter()
    .filter(|entry| entry.timestamp > cutoff)
    .map(|entry| entry.fact_id.as_str())
    .collect()
}

/// The facts eligible for display.
///
/// Hidden facts are always excluded. The category selection only narrows the
/// pool for premium users; free users draw from every category.
pub fn candidates<'a>(
  pool: &'a [Fact],
  history: &[FactHistoryEntry],
  state: &UserState,
  now: DateTime<Utc>,
  recency: Recency,
) -> Vec<&'a Fact> {
  let seen = match recency {
    Recency::ExcludeRecent => recently_seen(history, now),
    Recency::Recycle => HashSet::new(),
  };

  pool
    .iter()
    .filter(|fact| !fact.hidden)
    .filter(|fact| !state.premium || state.selected_categories.includes(fact.category))
    .filter(|fact| !seen.contains(fact.id.as_str()))
    .collect()
}

/// Choose one fact uniformly from the candidate set.
pub fn pick<'a, R: Rng + ?Sized>(
  pool: &'a [Fact],
  history: &[FactHistoryEntry],
  state: &UserState,
  now: DateTime<Utc>,
  recency: Recency,
  rng: &mut R,
) -> Pick<'a> {
  candidates(pool, history, state, now, recency)
    .choose(rng)
    .copied()
    .map_or(Pick::NoNewFacts, Pick::Fact)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use rand::{SeedableRng, rngs::StdRng};

  use super::*;
  use crate::fact::{Category, CategorySelection};

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap() }

  fn fact(id: &str, category: Category, hidden: bool) -> Fact {
    Fact {
      id: id.into(),
      text: format!("fact {id}"),
      category,
      source: None,
      tags: vec![],
      date_added: now() - Duration::days(400),
      hidden,
    }
  }

  fn free_state() -> UserState { UserState::fresh(now().date_naive()) }

  fn seen(id: &str, days_ago: i64) -> FactHistoryEntry {
    FactHistoryEntry::new(id, now() - Duration::days(days_ago))
  }

  #[test]
  fn never_returns_recent_facts() {
    let pool = vec![
      fact("a", Category::Space, false),
      fact("b", Category::Space, false),
      fact("c", Category::Space, false),
    ];
    let history = vec![seen("a", 3), seen("b", 179)];
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..25 {
      let picked =
        pick(&pool, &history, &free_state(), now(), Recency::ExcludeRecent, &mut rng);
      assert_eq!(picked, Pick::Fact(&pool[2]));
    }
  }

  #[test]
  fn entries_older_than_window_do_not_count() {
    let pool = vec![fact("a", Category::Food, false)];
    let history = vec![seen("a", 181)];
    let mut rng = StdRng::seed_from_u64(2);
    assert_eq!(
      pick(&pool, &history, &free_state(), now(), Recency::ExcludeRecent, &mut rng),
      Pick::Fact(&pool[0])
    );
  }

  #[test]
  fn exhausted_pool_yields_no_new_facts_and_recycle_reopens_it() {
    let pool = vec![fact("a", Category::Food, false), fact("b", Category::Food, false)];
    let history = vec![seen("a", 1), seen("b", 2)];
    let mut rng = StdRng::seed_from_u64(3);
    assert_eq!(
      pick(&pool, &history, &free_state(), now(), Recency::ExcludeRecent, &mut rng),
      Pick::NoNewFacts
    );
    assert!(matches!(
      pick(&pool, &history, &free_state(), now(), Recency::Recycle, &mut rng),
      Pick::Fact(_)
    ));
  }

  #[test]
  fn hidden_facts_are_never_picked() {
    let pool = vec![fact("h1", Category::History, true), fact("h2", Category::History, true)];
    let mut rng = StdRng::seed_from_u64(4);
    assert_eq!(
      pick(&pool, &[], &free_state(), now(), Recency::Recycle, &mut rng),
      Pick::NoNewFacts
    );
    assert_eq!(
      pick(&[], &[], &free_state(), now(), Recency::ExcludeRecent, &mut rng),
      Pick::NoNewFacts
    );
  }

  #[test]
  fn category_filter_applies_to_premium_only() {
    let pool = vec![fact("s", Category::Space, false), fact("f", Category::Food, false)];
    let mut state = free_state();
    state.selected_categories = CategorySelection::from_names(["space"]).unwrap();

    let free = candidates(&pool, &[], &state, now(), Recency::ExcludeRecent);
    assert_eq!(free.len(), 2);

    state.premium = true;
    let premium = candidates(&pool, &[], &state, now(), Recency::ExcludeRecent);
    assert_eq!(premium, vec![&pool[0]]);
  }

  #[test]
  fn premium_with_all_sees_every_category() {
    let pool = vec![fact("s", Category::Space, false), fact("f", Category::Food, false)];
    let mut state = free_state();
    state.premium = true;
    assert_eq!(candidates(&pool, &[], &state, now(), Recency::ExcludeRecent).len(), 2);
  }
}
