//! Fact types: the unit of content served by the backend and shown to the
//! user.

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rand::{Rng, seq::IteratorRandom};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};

use crate::{Error, Result};

// ─── Category ────────────────────────────────────────────────────────────────

/// The fixed set of fact categories.
///
/// Parsing is case-insensitive and accepts the legacy spellings used by older
/// settings pages (`language`, `technology`, `21st-century`).
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  EnumIter,
  EnumString,
  Serialize,
  Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Category {
  Animals,
  History,
  Space,
  Biology,
  #[strum(to_string = "languages", serialize = "language")]
  Languages,
  Food,
  Geography,
  Science,
  Culture,
  Records,
  Inventions,
  Sports,
  #[strum(to_string = "tech", serialize = "technology")]
  Tech,
  #[strum(to_string = "century", serialize = "21st-century")]
  Century,
}

impl Category {
  /// The canonical lowercase name stored in the database and sent over the
  /// wire.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Animals => "animals",
      Self::History => "history",
      Self::Space => "space",
      Self::Biology => "biology",
      Self::Languages => "languages",
      Self::Food => "food",
      Self::Geography => "geography",
      Self::Science => "science",
      Self::Culture => "culture",
      Self::Records => "records",
      Self::Inventions => "inventions",
      Self::Sports => "sports",
      Self::Tech => "tech",
      Self::Century => "century",
    }
  }

  /// Parse a user-supplied name, trimming surrounding whitespace.
  pub fn parse(name: &str) -> Result<Self> {
    Self::from_str(name.trim())
      .map_err(|_| Error::UnknownCategory(name.to_owned()))
  }

  /// Lenient parse used by bulk imports: unknown names land in
  /// [`Category::Science`].
  pub fn parse_or_science(name: &str) -> Self {
    Self::parse(name).unwrap_or(Self::Science)
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl TryFrom<String> for Category {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::parse(&value) }
}

impl From<Category> for &'static str {
  fn from(c: Category) -> Self { c.as_str() }
}

// ─── Category selection ──────────────────────────────────────────────────────

/// The categories a user wants facts from. Never empty.
///
/// Persisted as a list of names where `"all"` means every category, matching
/// what the settings page writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub enum CategorySelection {
  #[default]
  All,
  Only(BTreeSet<Category>),
}

impl CategorySelection {
  /// Build a selection from raw names. Rejects an empty list and unknown
  /// names; any `"all"` entry widens the selection to every category.
  pub fn from_names<I, S>(names: I) -> Result<Self>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut selected = BTreeSet::new();
    let mut all = false;
    for name in names {
      let name = name.as_ref().trim();
      if name.is_empty() {
        continue;
      }
      if name.eq_ignore_ascii_case("all") {
        all = true;
      } else {
        selected.insert(Category::parse(name)?);
      }
    }

    if all {
      Ok(Self::All)
    } else if selected.is_empty() {
      Err(Error::EmptyCategorySelection)
    } else {
      Ok(Self::Only(selected))
    }
  }

  pub fn includes(&self, category: Category) -> bool {
    match self {
      Self::All => true,
      Self::Only(set) => set.contains(&category),
    }
  }

  /// Choose the category filter for a single pool query. `None` means the
  /// query is unfiltered.
  pub fn pick_query<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Category> {
    match self {
      Self::All => None,
      Self::Only(set) => set.iter().copied().choose(rng),
    }
  }

  pub fn names(&self) -> Vec<String> {
    match self {
      Self::All => vec!["all".to_owned()],
      Self::Only(set) => set.iter().map(|c| c.as_str().to_owned()).collect(),
    }
  }
}

impl TryFrom<Vec<String>> for CategorySelection {
  type Error = Error;

  fn try_from(value: Vec<String>) -> Result<Self> { Self::from_names(value) }
}

impl From<CategorySelection> for Vec<String> {
  fn from(s: CategorySelection) -> Self { s.names() }
}

impl fmt::Display for CategorySelection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.names().join(", "))
  }
}

// ─── Fact ────────────────────────────────────────────────────────────────────

/// A single fact as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
  pub id:         String,
  pub text:       String,
  pub category:   Category,
  #[serde(default)]
  pub source:     Option<String>,
  #[serde(default)]
  pub tags:       Vec<String>,
  /// Server-assigned creation timestamp.
  #[serde(rename = "created_at", alias = "dateAdded")]
  pub date_added: DateTime<Utc>,
  /// Hidden facts stay in the store but are never selected for display.
  #[serde(default)]
  pub hidden:     bool,
}

// ─── NewFact ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::FactStore::add_fact`]. The id and `date_added` are
/// always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFact {
  pub text:     String,
  pub category: Category,
  pub source:   Option<String>,
  pub tags:     Vec<String>,
}

impl NewFact {
  pub fn new(text: impl Into<String>, category: Category) -> Self {
    Self { text: text.into(), category, source: None, tags: Vec::new() }
  }

  /// Trim the text and source, drop blank tags, and reject empty text.
  pub fn normalized(mut self) -> Result<Self> {
    self.text = normalize_text(&self.text)?;
    self.source = normalize_source(self.source);
    self.tags = normalize_tags(self.tags);
    Ok(self)
  }
}

// ─── FactUpdate ──────────────────────────────────────────────────────────────

/// Replacement values for an existing fact. `date_added` is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactUpdate {
  pub text:     String,
  pub category: Category,
  pub source:   Option<String>,
  pub tags:     Vec<String>,
  pub hidden:   bool,
}

impl FactUpdate {
  pub fn normalized(mut self) -> Result<Self> {
    self.text = normalize_text(&self.text)?;
    self.source = normalize_source(self.source);
    self.tags = normalize_tags(self.tags);
    Ok(self)
  }

  pub fn apply(self, fact: Fact) -> Fact {
    Fact {
      id: fact.id,
      text: self.text,
      category: self.category,
      source: self.source,
      tags: self.tags,
      date_added: fact.date_added,
      hidden: self.hidden,
    }
  }
}

fn normalize_text(text: &str) -> Result<String> {
  let text = text.trim();
  if text.is_empty() {
    return Err(Error::EmptyFactText);
  }
  Ok(text.to_owned())
}

fn normalize_source(source: Option<String>) -> Option<String> {
  source
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
  tags
    .into_iter()
    .map(|t| t.trim().to_owned())
    .filter(|t| !t.is_empty())
    .collect()
}

#[cfg(test)]
mod tests {
  use rand::{SeedableRng, rngs::StdRng};
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn category_parse_is_case_insensitive_and_accepts_aliases() {
    assert_eq!(Category::parse("Animals").unwrap(), Category::Animals);
    assert_eq!(Category::parse(" SPACE ").unwrap(), Category::Space);
    assert_eq!(Category::parse("language").unwrap(), Category::Languages);
    assert_eq!(Category::parse("technology").unwrap(), Category::Tech);
    assert_eq!(Category::parse("21st-century").unwrap(), Category::Century);
    assert!(matches!(
      Category::parse("astrology"),
      Err(Error::UnknownCategory(_))
    ));
  }

  #[test]
  fn category_names_roundtrip_through_parse() {
    for c in Category::iter() {
      assert_eq!(Category::parse(c.as_str()).unwrap(), c);
    }
  }

  #[test]
  fn unknown_import_category_falls_back_to_science() {
    assert_eq!(Category::parse_or_science("nonsense"), Category::Science);
    assert_eq!(Category::parse_or_science("Food"), Category::Food);
  }

  #[test]
  fn category_serializes_as_lowercase_name() {
    let json = serde_json::to_string(&Category::Tech).unwrap();
    assert_eq!(json, "\"tech\"");
    let parsed: Category = serde_json::from_str("\"Technology\"").unwrap();
    assert_eq!(parsed, Category::Tech);
  }

  #[test]
  fn selection_rejects_empty_and_unknown() {
    assert!(matches!(
      CategorySelection::from_names(Vec::<String>::new()),
      Err(Error::EmptyCategorySelection)
    ));
    assert!(matches!(
      CategorySelection::from_names(["  "]),
      Err(Error::EmptyCategorySelection)
    ));
    assert!(matches!(
      CategorySelection::from_names(["space", "bogus"]),
      Err(Error::UnknownCategory(_))
    ));
  }

  #[test]
  fn selection_with_all_includes_everything() {
    let sel = CategorySelection::from_names(["animals", "all"]).unwrap();
    assert_eq!(sel, CategorySelection::All);
    assert!(Category::iter().all(|c| sel.includes(c)));
    assert_eq!(sel.names(), vec!["all".to_string()]);
  }

  #[test]
  fn selection_pick_query_stays_inside_selection() {
    let sel = CategorySelection::from_names(["space", "food"]).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
      let c = sel.pick_query(&mut rng).unwrap();
      assert!(c == Category::Space || c == Category::Food);
    }
    assert_eq!(CategorySelection::All.pick_query(&mut rng), None);
  }

  #[test]
  fn selection_json_is_a_list_of_names() {
    let sel = CategorySelection::from_names(["Space", "animals"]).unwrap();
    let json = serde_json::to_value(&sel).unwrap();
    assert_eq!(json, serde_json::json!(["animals", "space"]));
    let back: CategorySelection = serde_json::from_value(json).unwrap();
    assert_eq!(back, sel);
    assert!(serde_json::from_value::<CategorySelection>(serde_json::json!([])).is_err());
  }

  #[test]
  fn new_fact_normalization() {
    let mut input = NewFact::new("  Octopuses have three hearts.  ", Category::Animals);
    input.source = Some("   ".into());
    input.tags = vec![" ocean ".into(), "".into()];
    let n = input.normalized().unwrap();
    assert_eq!(n.text, "Octopuses have three hearts.");
    assert_eq!(n.source, None);
    assert_eq!(n.tags, vec!["ocean".to_string()]);

    assert!(matches!(
      NewFact::new("   ", Category::Food).normalized(),
      Err(Error::EmptyFactText)
    ));
  }

  #[test]
  fn fact_json_uses_created_at() {
    let fact = Fact {
      id:         "f1".into(),
      text:       "Honey never spoils.".into(),
      category:   Category::Food,
      source:     None,
      tags:       vec![],
      date_added: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
      hidden:     false,
    };
    let json = serde_json::to_value(&fact).unwrap();
    assert!(json.get("created_at").is_some());
    assert_eq!(json["category"], "food");
    let back: Fact = serde_json::from_value(json).unwrap();
    assert_eq!(back, fact);
  }
}
