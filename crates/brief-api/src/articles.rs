//! Handlers for `/articles` and `/status`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/articles` | Optional `?status=<literal>&limit=&offset=`; newest first |
//! | `GET`  | `/articles/lookup` | `?url=<article url>`; 404 if not stored |
//! | `GET`  | `/status` | Article count for every status literal |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  Json,
  extract::{Query, State},
};
use brief_core::{
  article::{Article, ArticleStatus},
  store::{ArticleQuery, ArticleStore},
};
use serde::Deserialize;
use strum::IntoEnumIterator as _;

use crate::error::ApiError;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<ArticleStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /articles[?status=<status>&limit=<n>&offset=<n>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Article>>, ApiError>
where
  S: ArticleStore,
{
  let query = ArticleQuery {
    status: params.status,
    limit:  Some(params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)),
    offset: params.offset,
  };
  let articles = store
    .list_articles(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(articles))
}

// ─── Lookup ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LookupParams {
  pub url: String,
}

/// `GET /articles/lookup?url=<url>`
pub async fn lookup<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<LookupParams>,
) -> Result<Json<Article>, ApiError>
where
  S: ArticleStore,
{
  let article = store
    .get_article(&params.url)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("article {} not found", params.url)))?;
  Ok(Json(article))
}

// ─── Status counts ────────────────────────────────────────────────────────────

/// `GET /status` — `{"fetched": 3, "filtered_in": 0, ...}`
pub async fn counts<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<BTreeMap<&'static str, u64>>, ApiError>
where
  S: ArticleStore,
{
  let stored = store.status_counts().await.map_err(ApiError::store)?;
  let counts = ArticleStatus::iter()
    .map(|status| (status.as_str(), stored.get(&status).copied().unwrap_or(0)))
    .collect();
  Ok(Json(counts))
}
