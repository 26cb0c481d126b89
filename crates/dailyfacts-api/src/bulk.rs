//! `POST /facts/bulk-upload`: import facts from CSV text.
//!
//! The first line is a header naming the columns. Recognised names are
//! `text` (or `fact`), `category`, `source` and `tags`, in any order and any
//! case. A header that names neither `text` nor `fact` is treated as the
//! positional layout `text,category,source,tags`.
//!
//! Fields may be double-quoted; inside quotes commas and newlines are literal
//! and `""` is an escaped quote. Tags are separated by `;`. Rows without text
//! or category are skipped, unknown categories are filed under `science` and
//! a missing source becomes `"Bulk upload"`.

use axum::{Json, extract::State};
use dailyfacts_core::{
  fact::{Category, NewFact},
  store::FactStore,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, auth::Admin, error::ApiError};

pub const DEFAULT_SOURCE: &str = "Bulk upload";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkBody {
  pub csv_data: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkResult {
  pub success: bool,
  pub message: String,
  pub count:   usize,
}

/// `POST /facts/bulk-upload`, body `{"csvData": "..."}`.
pub async fn upload<S, P>(
  _admin: Admin,
  State(state): State<ApiState<S, P>>,
  Json(body): Json<BulkBody>,
) -> Result<Json<BulkResult>, ApiError>
where
  S: FactStore,
{
  let csv = body
    .csv_data
    .filter(|s| !s.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest("CSV data is required".into()))?;

  let facts = parse_facts(&csv);
  if facts.is_empty() {
    return Err(ApiError::BadRequest("No valid facts found in CSV data".into()));
  }

  let count = state.store.add_facts(facts).await.map_err(ApiError::store)?;
  tracing::info!(count, "bulk upload");

  Ok(Json(BulkResult {
    success: true,
    message: format!("Successfully uploaded {count} facts"),
    count,
  }))
}

// ─── Column layout ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
  text:     usize,
  category: Option<usize>,
  source:   Option<usize>,
  tags:     Option<usize>,
}

impl Columns {
  const POSITIONAL: Self = Self {
    text:     0,
    category: Some(1),
    source:   Some(2),
    tags:     Some(3),
  };

  fn from_header(header: &[String]) -> Self {
    let find = |names: &[&str]| {
      header
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
    };

    match find(&["text", "fact"]) {
      Some(text) => Self {
        text,
        category: find(&["category"]),
        source: find(&["source"]),
        tags: find(&["tags"]),
      },
      None => Self::POSITIONAL,
    }
  }
}

/// Parse CSV text into facts ready to insert. Invalid rows are dropped.
pub fn parse_facts(csv: &str) -> Vec<NewFact> {
  let mut records = parse_records(csv).into_iter();
  let Some(header) = records.next() else {
    return Vec::new();
  };
  let columns = Columns::from_header(&header);

  records
    .filter_map(|record| {
      let field = |idx: Option<usize>| {
        idx
          .and_then(|i| record.get(i))
          .map(|s| s.trim())
          .filter(|s| !s.is_empty())
      };

      let text = field(Some(columns.text))?;
      let category = field(columns.category)?;
      let tags = field(columns.tags)
        .map(|t| t.split(';').map(str::to_owned).collect())
        .unwrap_or_default();

      let fact = NewFact {
        text: text.to_owned(),
        category: Category::parse_or_science(category),
        source: Some(field(columns.source).unwrap_or(DEFAULT_SOURCE).to_owned()),
        tags,
      };
      fact.normalized().ok()
    })
    .collect()
}

// ─── Record splitting ─────────────────────────────────────────────────────────

/// Split CSV text into records of fields. Rows may have any number of fields;
/// rows with no content are skipped.
fn parse_records(input: &str) -> Vec<Vec<String>> {
  csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .from_reader(input.as_bytes())
    .into_records()
    .filter_map(|record| match record {
      Ok(record) => Some(record),
      Err(e) => {
        tracing::debug!(error = %e, "skipping unreadable CSV row");
        None
      }
    })
    .filter(|record| record.iter().any(|f| !f.trim().is_empty()))
    .map(|record| record.iter().map(str::to_owned).collect())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn quoted_fields_keep_commas_and_escaped_quotes() {
    let records = parse_records("a,\"b, c\",\"say \"\"hi\"\"\"\n\n1,2,3\r\n");
    assert_eq!(records, vec![
      vec!["a".to_string(), "b, c".into(), "say \"hi\"".into()],
      vec!["1".to_string(), "2".into(), "3".into()],
    ]);
  }

  #[test]
  fn quoted_newline_stays_in_field() {
    let records = parse_records("text\n\"line one\nline two\"");
    assert_eq!(records[1], vec!["line one\nline two".to_string()]);
  }

  #[test]
  fn header_columns_in_any_order() {
    let facts = parse_facts(
      "Category,Source,Fact,Tags\nspace,NASA,\"Venus spins backwards, slowly.\",planets;venus\n",
    );
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].text, "Venus spins backwards, slowly.");
    assert_eq!(facts[0].category, Category::Space);
    assert_eq!(facts[0].source.as_deref(), Some("NASA"));
    assert_eq!(facts[0].tags, vec!["planets".to_string(), "venus".into()]);
  }

  #[test]
  fn defaults_and_skipped_rows() {
    let facts = parse_facts(
      "text,category,source\nOctopi have three hearts.,astrology,\n,food,x\nNo category,,\n",
    );
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].category, Category::Science);
    assert_eq!(facts[0].source.as_deref(), Some(DEFAULT_SOURCE));
    assert!(facts[0].tags.is_empty());
  }

  #[test]
  fn unnamed_header_is_positional() {
    let facts = parse_facts("a,b,c\nHoney never spoils.,food,Archive\n");
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].category, Category::Food);
    assert_eq!(facts[0].source.as_deref(), Some("Archive"));
  }

  #[test]
  fn ragged_and_blank_rows() {
    let records = parse_records("text,category,source
 , ,
short,space
");
    assert_eq!(records, vec![
      vec!["text".to_string(), "category".into(), "source".into()],
      vec!["short".to_string(), "space".into()],
    ]);
  }

  #[test]
  fn header_only_yields_nothing() {
    assert!(parse_facts("text,category\n").is_empty());
    assert!(parse_facts("").is_empty());
  }
}
