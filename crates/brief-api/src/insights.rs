//! Handlers for `/insights` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/insights` | Optional `?limit=`; newest first |
//! | `GET`  | `/insights/{date}` | `YYYY-MM-DD`; 400 if malformed, 404 if absent |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use brief_core::{insight::DailyInsight, store::ArticleStore};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ApiError;

const DEFAULT_LIMIT: usize = 30;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit: Option<usize>,
}

/// `GET /insights[?limit=<n>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<DailyInsight>>, ApiError>
where
  S: ArticleStore,
{
  let insights = store
    .list_daily_insights(params.limit.unwrap_or(DEFAULT_LIMIT))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(insights))
}

/// `GET /insights/{date}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(date): Path<String>,
) -> Result<Json<DailyInsight>, ApiError>
where
  S: ArticleStore,
{
  let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
    .map_err(|e| ApiError::BadRequest(format!("invalid date {date:?}: {e}")))?;
  let insight = store
    .get_daily_insight(date)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no insight for {date}")))?;
  Ok(Json(insight))
}
