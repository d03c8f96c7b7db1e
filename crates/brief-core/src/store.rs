//! The `ArticleStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `brief-store-sqlite`).
//! The pipeline stages and the read API depend on this abstraction, not on
//! any concrete backend.
//!
//! Every write is a single atomic statement (or transaction) against one
//! row, so a crash between an AI call and its persist leaves the row at its
//! previous status, ready to be retried.

use std::{collections::BTreeMap, future::Future};

use chrono::{Duration, NaiveDate};

use crate::{
  article::{AnalysisResult, Article, ArticleStatus, NewArticle},
  insight::DailyInsight,
};

/// Content written by migrations from the legacy JSON files; treated as
/// missing content by [`ArticleStore::repair`].
pub const PLACEHOLDER_CONTENT: &str = "From JSON Migration";

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`ArticleStore::list_articles`].
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
  pub status: Option<ArticleStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// Counts returned by [`ArticleStore::repair`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
  /// `scraped`/`analyzed` rows with empty or placeholder content, moved back
  /// to `filtered_in`.
  pub content_reset: usize,
  /// `analyzed` rows with missing tags, moved back to `scraped`.
  pub tags_reset:    usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the persisted article state machine.
///
/// Stage-owned updates are guarded: they only apply while the row is still in
/// the owning stage's input status, and report whether they applied. A stale
/// or duplicated write therefore never moves a row backwards.
pub trait ArticleStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Ingestion ─────────────────────────────────────────────────────────

  /// Insert a freshly fetched article, or merge into the existing row.
  ///
  /// On conflict the title is refreshed, `image_url` and `published_date` are
  /// only filled when currently null, and `updated_at` is bumped. Returns
  /// `true` when the row was newly created.
  fn upsert_fetched(
    &self,
    article: NewArticle,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Articles currently at `status`. With a `window`, only articles published
  /// within that trailing window (or created within it when the publish date
  /// is unknown).
  fn select_by_status(
    &self,
    status: ArticleStatus,
    window: Option<Duration>,
  ) -> impl Future<Output = Result<Vec<Article>, Self::Error>> + Send + '_;

  fn count_by_status(
    &self,
    status: ArticleStatus,
    window: Option<Duration>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Number of articles per status; statuses with no rows are omitted.
  fn status_counts(
    &self,
  ) -> impl Future<Output = Result<BTreeMap<ArticleStatus, u64>, Self::Error>>
  + Send
  + '_;

  fn get_article<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<Option<Article>, Self::Error>> + Send + 'a;

  /// Newest-first listing for the dashboard.
  fn list_articles<'a>(
    &'a self,
    query: &'a ArticleQuery,
  ) -> impl Future<Output = Result<Vec<Article>, Self::Error>> + Send + 'a;

  // ── Stage transitions ─────────────────────────────────────────────────

  /// Record a filtering verdict. `status` must be `filtered_in` or
  /// `filtered_out`; applies only to `fetched` rows.
  fn update_filter_result<'a>(
    &'a self,
    url: &'a str,
    status: ArticleStatus,
    score: i32,
    reason: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Store extracted content and move a `filtered_in` row to `scraped`.
  fn update_scrape_result<'a>(
    &'a self,
    url: &'a str,
    content: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Store an analysis and move a `scraped` row to `analyzed`.
  fn update_analysis_result<'a>(
    &'a self,
    url: &'a str,
    analysis: &'a AnalysisResult,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Reconciliation ────────────────────────────────────────────────────

  /// Move rows whose stage output is missing back to the stage that produces
  /// it. Idempotent: a second call on unchanged data resets nothing.
  fn repair(
    &self,
  ) -> impl Future<Output = Result<RepairReport, Self::Error>> + Send + '_;

  // ── Daily insights ────────────────────────────────────────────────────

  /// Insert the insight for its date, fully replacing any existing row.
  fn upsert_daily_insight<'a>(
    &'a self,
    insight: &'a DailyInsight,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_daily_insight(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<DailyInsight>, Self::Error>> + Send + '_;

  /// Newest-first.
  fn list_daily_insights(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<DailyInsight>, Self::Error>> + Send + '_;
}
