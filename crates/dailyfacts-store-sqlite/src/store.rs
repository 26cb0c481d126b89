//! [`SqliteStore`]: the SQLite implementation of [`FactStore`] and
//! [`KeyValueStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use serde_json::{Map, Value};
use uuid::Uuid;

use dailyfacts_core::{
  fact::{Fact, FactUpdate, NewFact},
  storage::KeyValueStore,
  store::{CategoryCount, FactOrder, FactQuery, FactStats, FactStore},
};

use crate::{
  Error, Result,
  encode::{FACT_COLUMNS, RawFact, decode_category, encode_category, encode_dt, encode_tags},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Daily Facts store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Column values for one `facts` row, ready to bind.
struct FactRow {
  fact_id:    String,
  text:       String,
  category:   &'static str,
  source:     Option<String>,
  tags:       String,
  date_added: String,
  hidden:     bool,
}

impl FactRow {
  fn encode(fact: &Fact) -> Result<Self> {
    Ok(Self {
      fact_id:    fact.id.clone(),
      text:       fact.text.clone(),
      category:   encode_category(fact.category),
      source:     fact.source.clone(),
      tags:       encode_tags(&fact.tags)?,
      date_added: encode_dt(fact.date_added),
      hidden:     fact.hidden,
    })
  }

  fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<usize> {
    conn.execute(
      "INSERT INTO facts (fact_id, text, category, source, tags, date_added, hidden)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      rusqlite::params![
        self.fact_id,
        self.text,
        self.category,
        self.source,
        self.tags,
        self.date_added,
        self.hidden,
      ],
    )
  }
}

/// Build a stored fact from store-assigned id and timestamp.
fn new_fact(input: NewFact) -> Result<Fact> {
  let input = input.normalized()?;
  Ok(Fact {
    id:         Uuid::new_v4().to_string(),
    text:       input.text,
    category:   input.category,
    source:     input.source,
    tags:       input.tags,
    date_added: Utc::now(),
    hidden:     false,
  })
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── FactStore impl ──────────────────────────────────────────────────────────

impl FactStore for SqliteStore {
  type Error = Error;

  async fn list_facts(&self, query: &FactQuery) -> Result<Vec<Fact>> {
    let category = query.category.map(encode_category);
    let hidden   = query.hidden;
    // A negative LIMIT means no limit in SQLite.
    let limit    = query
      .limit
      .map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let order    = match query.order {
      FactOrder::Newest => "date_added DESC, rowid DESC",
      FactOrder::Random => "RANDOM()",
    };

    let raws: Vec<RawFact> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {FACT_COLUMNS} FROM facts
           WHERE (?1 IS NULL OR category = ?1)
             AND (?2 IS NULL OR hidden = ?2)
           ORDER BY {order}
           LIMIT ?3"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![category, hidden, limit], RawFact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFact::into_fact).collect()
  }

  async fn get_fact(&self, id: &str) -> Result<Option<Fact>> {
    let id = id.to_owned();

    let raw: Option<RawFact> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {FACT_COLUMNS} FROM facts WHERE fact_id = ?1"),
              rusqlite::params![id],
              RawFact::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFact::into_fact).transpose()
  }

  async fn add_fact(&self, input: NewFact) -> Result<Fact> {
    let fact = new_fact(input)?;
    let row = FactRow::encode(&fact)?;

    self
      .conn
      .call(move |conn| {
        row.insert(conn)?;
        Ok(())
      })
      .await?;

    Ok(fact)
  }

  async fn add_facts(&self, inputs: Vec<NewFact>) -> Result<usize> {
    let rows = inputs
      .into_iter()
      .map(|input| new_fact(input).and_then(|f| FactRow::encode(&f)))
      .collect::<Result<Vec<_>>>()?;

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for row in &rows {
          row.insert(&tx)?;
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    Ok(inserted)
  }

  async fn update_fact(&self, id: &str, update: FactUpdate) -> Result<Option<Fact>> {
    let update = update.normalized()?;
    let Some(existing) = self.get_fact(id).await? else {
      return Ok(None);
    };
    let fact = update.apply(existing);
    let row = FactRow::encode(&fact)?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE facts
           SET text = ?2, category = ?3, source = ?4, tags = ?5, hidden = ?6
           WHERE fact_id = ?1",
          rusqlite::params![row.fact_id, row.text, row.category, row.source, row.tags, row.hidden],
        )?)
      })
      .await?;

    // Deleted between the read and the write.
    Ok((changed > 0).then_some(fact))
  }

  async fn delete_fact(&self, id: &str) -> Result<bool> {
    let id = id.to_owned();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM facts WHERE fact_id = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn stats(&self) -> Result<FactStats> {
    let (total, hidden, by_category): (i64, i64, Vec<(String, i64)>) = self
      .conn
      .call(|conn| {
        let (total, hidden): (i64, i64) = conn.query_row(
          "SELECT COUNT(*), COALESCE(SUM(hidden), 0) FROM facts",
          [],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        let mut stmt = conn.prepare(
          "SELECT category, COUNT(*) AS n FROM facts
           GROUP BY category
           ORDER BY n DESC, category ASC",
        )?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total, hidden, rows))
      })
      .await?;

    let categories = by_category
      .into_iter()
      .map(|(name, n)| {
        Ok(CategoryCount {
          category: decode_category(&name)?,
          count:    n.unsigned_abs(),
        })
      })
      .collect::<Result<Vec<_>>>()?;

    let total = total.unsigned_abs();
    let hidden = hidden.unsigned_abs();
    Ok(FactStats {
      total,
      visible: total.saturating_sub(hidden),
      hidden,
      categories,
    })
  }
}

// ─── KeyValueStore impl ──────────────────────────────────────────────────────

impl KeyValueStore for SqliteStore {
  type Error = Error;

  async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
    let keys: Vec<String> = keys.iter().map(|k| (*k).to_owned()).collect();

    let rows: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare("SELECT key, value_json FROM kv WHERE key = ?1")?;
        let mut rows = Vec::with_capacity(keys.len());
        for key in keys {
          if let Some(value) = stmt
            .query_row(rusqlite::params![key], |r| r.get::<_, String>(1))
            .optional()?
          {
            rows.push((key, value));
          }
        }
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(k, v)| Ok((k, serde_json::from_str(&v)?)))
      .collect()
  }

  async fn set(&self, values: Map<String, Value>) -> Result<()> {
    let rows = values
      .into_iter()
      .map(|(k, v)| Ok((k, serde_json::to_string(&v)?)))
      .collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO kv (key, value_json) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
          )?;
          for (key, value) in &rows {
            stmt.execute(rusqlite::params![key, value])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<()> {
    let key = key.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
