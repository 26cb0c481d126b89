//! Integration tests for `SqliteStore` against an in-memory database.

use dailyfacts_core::{
  fact::{Category, FactUpdate, NewFact},
  storage::{KeyValueStore, StateStore, keys},
  store::{FactOrder, FactQuery, FactStore},
};
use serde_json::{Map, Value, json};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn fact(text: &str, category: Category) -> NewFact { NewFact::new(text, category) }

// ─── Adding and reading ──────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_fact() {
  let s = store().await;

  let mut input = fact("  A group of flamingos is a flamboyance. ", Category::Animals);
  input.source = Some("Zoo guide".into());
  input.tags = vec!["birds".into(), " ".into()];
  let added = s.add_fact(input).await.unwrap();

  assert_eq!(added.text, "A group of flamingos is a flamboyance.");
  assert_eq!(added.tags, vec!["birds".to_string()]);
  assert!(!added.hidden);

  let fetched = s.get_fact(&added.id).await.unwrap().unwrap();
  assert_eq!(fetched.id, added.id);
  assert_eq!(fetched.category, Category::Animals);
  assert_eq!(fetched.source.as_deref(), Some("Zoo guide"));
  assert_eq!(fetched.tags, added.tags);
  assert_eq!(
    fetched.date_added.timestamp_millis(),
    added.date_added.timestamp_millis()
  );
}

#[tokio::test]
async fn get_fact_missing_returns_none() {
  let s = store().await;
  assert!(s.get_fact("no-such-id").await.unwrap().is_none());
}

#[tokio::test]
async fn empty_text_is_rejected() {
  let s = store().await;
  let err = s.add_fact(fact("   ", Category::Food)).await.unwrap_err();
  assert!(matches!(err, Error::Core(dailyfacts_core::Error::EmptyFactText)));
}

#[tokio::test]
async fn add_facts_inserts_all_or_nothing() {
  let s = store().await;

  let count = s
    .add_facts(vec![
      fact("Venus spins backwards.", Category::Space),
      fact("Sharks predate trees.", Category::Animals),
    ])
    .await
    .unwrap();
  assert_eq!(count, 2);

  let err = s
    .add_facts(vec![fact("Fine.", Category::Food), fact("", Category::Food)])
    .await;
  assert!(err.is_err());
  assert_eq!(s.list_facts(&FactQuery::default()).await.unwrap().len(), 2);
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_filters_by_category_and_visibility() {
  let s = store().await;
  let space = s.add_fact(fact("Space is silent.", Category::Space)).await.unwrap();
  s.add_fact(fact("Mars has dust storms.", Category::Space)).await.unwrap();
  s.add_fact(fact("Cheese is old milk.", Category::Food)).await.unwrap();

  s.update_fact(
    &space.id,
    FactUpdate {
      text:     space.text.clone(),
      category: Category::Space,
      source:   None,
      tags:     vec![],
      hidden:   true,
    },
  )
  .await
  .unwrap();

  let all_space = s
    .list_facts(&FactQuery { category: Some(Category::Space), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(all_space.len(), 2);

  let visible_space = s
    .list_facts(&FactQuery {
      category: Some(Category::Space),
      hidden: Some(false),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(visible_space.len(), 1);
  assert_eq!(visible_space[0].text, "Mars has dust storms.");

  let visible = s.list_facts(&FactQuery::visible()).await.unwrap();
  assert_eq!(visible.len(), 2);
  assert!(visible.iter().all(|f| !f.hidden));
}

#[tokio::test]
async fn list_newest_first_and_limit() {
  let s = store().await;
  for text in ["first", "second", "third"] {
    s.add_fact(fact(text, Category::History)).await.unwrap();
  }

  let newest = s.list_facts(&FactQuery::default()).await.unwrap();
  let texts: Vec<_> = newest.iter().map(|f| f.text.as_str()).collect();
  assert_eq!(texts, ["third", "second", "first"]);

  let random_two = s
    .list_facts(&FactQuery {
      limit: Some(2),
      order: FactOrder::Random,
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(random_two.len(), 2);
}

// ─── Update and delete ───────────────────────────────────────────────────────

#[tokio::test]
async fn update_keeps_id_and_date_added() {
  let s = store().await;
  let original = s.add_fact(fact("Old text", Category::Culture)).await.unwrap();

  let updated = s
    .update_fact(
      &original.id,
      FactUpdate {
        text:     "New text".into(),
        category: Category::Languages,
        source:   Some("Atlas".into()),
        tags:     vec!["a".into(), "b".into()],
        hidden:   false,
      },
    )
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.id, original.id);
  assert_eq!(updated.text, "New text");
  assert_eq!(updated.category, Category::Languages);

  let stored = s.get_fact(&original.id).await.unwrap().unwrap();
  assert_eq!(stored.tags, vec!["a".to_string(), "b".to_string()]);
  assert_eq!(
    stored.date_added.timestamp_millis(),
    original.date_added.timestamp_millis()
  );
}

#[tokio::test]
async fn update_missing_returns_none() {
  let s = store().await;
  let result = s
    .update_fact(
      "ghost",
      FactUpdate {
        text:     "x".into(),
        category: Category::Food,
        source:   None,
        tags:     vec![],
        hidden:   false,
      },
    )
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn delete_reports_whether_a_row_went_away() {
  let s = store().await;
  let f = s.add_fact(fact("Short-lived", Category::Records)).await.unwrap();
  assert!(s.delete_fact(&f.id).await.unwrap());
  assert!(!s.delete_fact(&f.id).await.unwrap());
  assert!(s.get_fact(&f.id).await.unwrap().is_none());
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_count_by_category() {
  let s = store().await;
  assert_eq!(s.stats().await.unwrap().total, 0);

  s.add_fact(fact("a", Category::Space)).await.unwrap();
  s.add_fact(fact("b", Category::Space)).await.unwrap();
  let hidden = s.add_fact(fact("c", Category::Food)).await.unwrap();
  s.update_fact(
    &hidden.id,
    FactUpdate {
      text:     "c".into(),
      category: Category::Food,
      source:   None,
      tags:     vec![],
      hidden:   true,
    },
  )
  .await
  .unwrap();

  let stats = s.stats().await.unwrap();
  assert_eq!((stats.total, stats.visible, stats.hidden), (3, 2, 1));
  assert_eq!(stats.categories[0].category, Category::Space);
  assert_eq!(stats.categories[0].count, 2);
  assert_eq!(stats.categories[1].category, Category::Food);
}

// ─── Key-value state ─────────────────────────────────────────────────────────

#[tokio::test]
async fn kv_get_set_remove() {
  let s = store().await;

  let mut values = Map::new();
  values.insert("a".into(), json!(1));
  values.insert("b".into(), json!({ "nested": [true] }));
  s.set(values).await.unwrap();

  let got = s.get(&["a", "b", "missing"]).await.unwrap();
  assert_eq!(got.len(), 2);
  assert_eq!(got["b"], json!({ "nested": [true] }));

  let mut overwrite = Map::new();
  overwrite.insert("a".into(), Value::String("two".into()));
  s.set(overwrite).await.unwrap();
  assert_eq!(s.get(&["a"]).await.unwrap()["a"], json!("two"));

  s.remove("a").await.unwrap();
  assert!(s.get(&["a"]).await.unwrap().is_empty());
}

#[tokio::test]
async fn state_store_over_sqlite() {
  let state = StateStore::new(store().await);
  let today = chrono::NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
  state.install_defaults(today).await.unwrap();

  let loaded = state.load_user_state(today).await.unwrap();
  assert_eq!(loaded.daily_count, 0);
  assert_eq!(loaded.last_reset_date, today);

  let raw = state.inner().get(&[keys::SELECTED_CATEGORIES]).await.unwrap();
  assert_eq!(raw[keys::SELECTED_CATEGORIES], json!(["all"]));
}
