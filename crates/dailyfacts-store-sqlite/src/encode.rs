//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with millisecond precision, so they sort
//! lexically. Tags are a compact JSON array.

use chrono::{DateTime, SecondsFormat, Utc};
use dailyfacts_core::fact::{Category, Fact};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Category ────────────────────────────────────────────────────────────────

pub fn encode_category(c: Category) -> &'static str { c.as_str() }

pub fn decode_category(s: &str) -> Result<Category> { Ok(Category::parse(s)?) }

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawFact::from_row`].
pub const FACT_COLUMNS: &str =
  "fact_id, text, category, source, tags, date_added, hidden";

/// Raw values read directly from a `facts` row.
pub struct RawFact {
  pub fact_id:    String,
  pub text:       String,
  pub category:   String,
  pub source:     Option<String>,
  pub tags:       String,
  pub date_added: String,
  pub hidden:     bool,
}

impl RawFact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      fact_id:    row.get(0)?,
      text:       row.get(1)?,
      category:   row.get(2)?,
      source:     row.get(3)?,
      tags:       row.get(4)?,
      date_added: row.get(5)?,
      hidden:     row.get(6)?,
    })
  }

  pub fn into_fact(self) -> Result<Fact> {
    Ok(Fact {
      id:         self.fact_id,
      text:       self.text,
      category:   decode_category(&self.category)?,
      source:     self.source,
      tags:       decode_tags(&self.tags)?,
      date_added: decode_dt(&self.date_added)?,
      hidden:     self.hidden,
    })
  }
}
