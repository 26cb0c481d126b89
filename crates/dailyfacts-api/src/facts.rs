//! Handlers for `/facts` endpoints.
//!
//! | Method   | Path          | Notes |
//! |----------|---------------|-------|
//! | `GET`    | `/facts`      | Optional `category`, `limit`, `hidden`, `order` |
//! | `GET`    | `/facts/:id`  | Single fact |
//! | `POST`   | `/facts`      | Body: [`NewFactBody`]; returns 201. Admin only |
//! | `PUT`    | `/facts/:id`  | Body: [`UpdateFactBody`]. Admin only |
//! | `DELETE` | `/facts/:id`  | Returns the number of rows removed. Admin only |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use dailyfacts_core::{
  fact::{Category, Fact, FactUpdate, NewFact},
  store::{FactOrder, FactQuery, FactStore},
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, auth::Admin, error::ApiError};

/// `category=all` (or absent) means no category filter.
pub(crate) fn category_filter(raw: Option<&str>) -> Result<Option<Category>, ApiError> {
  match raw.map(str::trim) {
    None | Some("") => Ok(None),
    Some(name) if name.eq_ignore_ascii_case("all") => Ok(None),
    Some(name) => Category::parse(name)
      .map(Some)
      .map_err(|e| ApiError::BadRequest(e.to_string())),
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub category: Option<String>,
  pub limit:    Option<usize>,
  /// Restrict to hidden (`true`) or visible (`false`) facts.
  pub hidden:   Option<bool>,
  /// Defaults to `random` when `limit` is given, `newest` otherwise.
  pub order:    Option<FactOrder>,
}

#[derive(Debug, Serialize)]
pub struct FactList {
  pub success: bool,
  pub facts:   Vec<Fact>,
  pub count:   usize,
}

/// `GET /facts[?category=...][&limit=N][&hidden=bool][&order=newest|random]`
pub async fn list<S, P>(
  State(state): State<ApiState<S, P>>,
  Query(params): Query<ListParams>,
) -> Result<Json<FactList>, ApiError>
where
  S: FactStore,
{
  let query = FactQuery {
    category: category_filter(params.category.as_deref())?,
    hidden:   params.hidden,
    limit:    params.limit,
    order:    params.order.unwrap_or(if params.limit.is_some() {
      FactOrder::Random
    } else {
      FactOrder::Newest
    }),
  };

  let facts = state.store.list_facts(&query).await.map_err(ApiError::store)?;
  Ok(Json(FactList { success: true, count: facts.len(), facts }))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FactEnvelope {
  pub success: bool,
  pub fact:    Fact,
}

/// `GET /facts/:id`
pub async fn get_one<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(id): Path<String>,
) -> Result<Json<FactEnvelope>, ApiError>
where
  S: FactStore,
{
  let fact = state
    .store
    .get_fact(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("Fact {id} not found")))?;
  Ok(Json(FactEnvelope { success: true, fact }))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /facts`.
#[derive(Debug, Deserialize)]
pub struct NewFactBody {
  #[serde(default)]
  pub text:     String,
  #[serde(default)]
  pub category: String,
  pub source:   Option<String>,
  #[serde(default)]
  pub tags:     Vec<String>,
}

fn required(text: &str, category: &str) -> Result<Category, ApiError> {
  if text.trim().is_empty() || category.trim().is_empty() {
    return Err(ApiError::BadRequest("Text and category are required".into()));
  }
  Category::parse(category).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// `POST /facts` returns 201 and the stored fact.
pub async fn create<S, P>(
  _admin: Admin,
  State(state): State<ApiState<S, P>>,
  Json(body): Json<NewFactBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FactStore,
{
  let category = required(&body.text, &body.category)?;
  let input = NewFact {
    text: body.text,
    category,
    source: body.source,
    tags: body.tags,
  };

  let fact = state.store.add_fact(input).await.map_err(ApiError::store)?;
  tracing::info!(id = %fact.id, category = %fact.category, "fact added");
  Ok((StatusCode::CREATED, Json(FactEnvelope { success: true, fact })))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateFactBody {
  #[serde(default)]
  pub text:     String,
  #[serde(default)]
  pub category: String,
  pub source:   Option<String>,
  #[serde(default)]
  pub tags:     Vec<String>,
  #[serde(default)]
  pub hidden:   bool,
}

/// `PUT /facts/:id`
pub async fn update<S, P>(
  _admin: Admin,
  State(state): State<ApiState<S, P>>,
  Path(id): Path<String>,
  Json(body): Json<UpdateFactBody>,
) -> Result<Json<FactEnvelope>, ApiError>
where
  S: FactStore,
{
  let category = required(&body.text, &body.category)?;
  let update = FactUpdate {
    text: body.text,
    category,
    source: body.source,
    tags: body.tags,
    hidden: body.hidden,
  };

  let fact = state
    .store
    .update_fact(&id, update)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Fact not found".into()))?;
  Ok(Json(FactEnvelope { success: true, fact }))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Deleted {
  pub success: bool,
  pub changes: u32,
}

/// `DELETE /facts/:id`. Deleting a missing id is not an error; `changes` is
/// then `0`.
pub async fn delete<S, P>(
  _admin: Admin,
  State(state): State<ApiState<S, P>>,
  Path(id): Path<String>,
) -> Result<Json<Deleted>, ApiError>
where
  S: FactStore,
{
  let removed = state.store.delete_fact(&id).await.map_err(ApiError::store)?;
  Ok(Json(Deleted { success: true, changes: u32::from(removed) }))
}
