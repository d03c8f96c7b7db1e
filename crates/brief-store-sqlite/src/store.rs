//! [`SqliteStore`] — the SQLite implementation of [`ArticleStore`].

use std::{collections::BTreeMap, path::Path};

use brief_core::{
  article::{AnalysisResult, Article, ArticleStatus, NewArticle},
  insight::DailyInsight,
  store::{ArticleQuery, ArticleStore, PLACEHOLDER_CONTENT, RepairReport},
};
use chrono::{Duration, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use tracing::{debug, info};

use crate::{
  Error, Result,
  encode::{
    ARTICLE_COLUMNS, INSIGHT_COLUMNS, RawArticle, RawInsight, encode_date,
    encode_dt, encode_list, encode_tags,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An article store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    debug!(path = %path.display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
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

  /// Run a guarded single-row update: `sql` must bind the url as `?1` and
  /// carry its own `WHERE status = ...` guard.
  async fn guarded_update(
    &self,
    sql: &'static str,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(sql, rusqlite::params_from_iter(params))?)
      })
      .await?;
    Ok(changed == 1)
  }

  /// Run arbitrary SQL; lets tests seed legacy rows the API cannot produce.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Lower bound on `COALESCE(published_date, created_at)` for a trailing window.
fn window_cutoff(window: Option<Duration>) -> Option<String> {
  window.map(|w| encode_dt(Utc::now() - w))
}

fn text(s: impl Into<String>) -> rusqlite::types::Value {
  rusqlite::types::Value::Text(s.into())
}

fn opt_text(s: Option<impl Into<String>>) -> rusqlite::types::Value {
  s.map_or(rusqlite::types::Value::Null, text)
}

// ─── ArticleStore impl ───────────────────────────────────────────────────────

impl ArticleStore for SqliteStore {
  type Error = Error;

  // ── Ingestion ─────────────────────────────────────────────────────────────

  async fn upsert_fetched(&self, article: NewArticle) -> Result<bool> {
    let now_str       = encode_dt(Utc::now());
    let published_str = article.published_at.map(encode_dt);

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existed = tx
          .query_row(
            "SELECT 1 FROM articles WHERE url = ?1",
            rusqlite::params![article.url],
            |_| Ok(()),
          )
          .optional()?
          .is_some();

        tx.execute(
          "INSERT INTO articles (
             url, title, source, published_date, image_url,
             status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, 'fetched', ?6, ?6)
           ON CONFLICT (url) DO UPDATE SET
             title          = excluded.title,
             image_url      = COALESCE(articles.image_url, excluded.image_url),
             published_date = COALESCE(articles.published_date, excluded.published_date),
             updated_at     = excluded.updated_at",
          rusqlite::params![
            article.url,
            article.title,
            article.source,
            published_str,
            article.image_url,
            now_str,
          ],
        )?;

        tx.commit()?;
        Ok(!existed)
      })
      .await?;

    Ok(created)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn select_by_status(
    &self,
    status: ArticleStatus,
    window: Option<Duration>,
  ) -> Result<Vec<Article>> {
    let status_str = status.as_str();
    let cutoff     = window_cutoff(window);

    let raws: Vec<RawArticle> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ARTICLE_COLUMNS} FROM articles
           WHERE status = ?1
             AND (?2 IS NULL OR COALESCE(published_date, created_at) >= ?2)
           ORDER BY created_at, url"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![status_str, cutoff], RawArticle::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawArticle::into_article).collect()
  }

  async fn count_by_status(
    &self,
    status: ArticleStatus,
    window: Option<Duration>,
  ) -> Result<u64> {
    let status_str = status.as_str();
    let cutoff     = window_cutoff(window);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM articles
           WHERE status = ?1
             AND (?2 IS NULL OR COALESCE(published_date, created_at) >= ?2)",
          rusqlite::params![status_str, cutoff],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count.max(0) as u64)
  }

  async fn status_counts(&self) -> Result<BTreeMap<ArticleStatus, u64>> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT status, COUNT(*) FROM articles GROUP BY status")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(status, count)| -> Result<(ArticleStatus, u64)> {
        Ok((ArticleStatus::parse(&status)?, count.max(0) as u64))
      })
      .collect()
  }

  async fn get_article(&self, url: &str) -> Result<Option<Article>> {
    let url = url.to_owned();

    let raw: Option<RawArticle> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE url = ?1"),
            rusqlite::params![url],
            RawArticle::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawArticle::into_article).transpose()
  }

  async fn list_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>> {
    let status_str = query.status.map(ArticleStatus::as_str);
    let limit_val  = query.limit.unwrap_or(100) as i64;
    let offset_val = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawArticle> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ARTICLE_COLUMNS} FROM articles
           WHERE (?1 IS NULL OR status = ?1)
           ORDER BY COALESCE(published_date, created_at) DESC, url
           LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![status_str, limit_val, offset_val],
            RawArticle::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawArticle::into_article).collect()
  }

  // ── Stage transitions ─────────────────────────────────────────────────────

  async fn update_filter_result(
    &self,
    url: &str,
    status: ArticleStatus,
    score: i32,
    reason: &str,
  ) -> Result<bool> {
    if !ArticleStatus::Fetched.can_advance_to(status) {
      return Err(
        brief_core::Error::InvalidTransition {
          from: ArticleStatus::Fetched,
          to:   status,
        }
        .into(),
      );
    }

    self
      .guarded_update(
        "UPDATE articles
         SET status = ?2, filter_score = ?3, filter_reason = ?4, updated_at = ?5
         WHERE url = ?1 AND status = 'fetched'",
        vec![
          text(url),
          text(status.as_str()),
          rusqlite::types::Value::Integer(score.into()),
          text(reason),
          text(encode_dt(Utc::now())),
        ],
      )
      .await
  }

  async fn update_scrape_result(&self, url: &str, content: &str) -> Result<bool> {
    let now_str = encode_dt(Utc::now());

    self
      .guarded_update(
        "UPDATE articles
         SET status = 'scraped', content = ?2, scraped_at = ?3, updated_at = ?3
         WHERE url = ?1 AND status = 'filtered_in'",
        vec![text(url), text(content), text(now_str)],
      )
      .await
  }

  async fn update_analysis_result(
    &self,
    url: &str,
    analysis: &AnalysisResult,
  ) -> Result<bool> {
    let tags_str = encode_tags(&analysis.tags)?;

    self
      .guarded_update(
        "UPDATE articles
         SET status = 'analyzed', summary = ?2, tags = ?3, author_intent = ?4,
             impact_analysis = ?5, analyzed_at = ?6, model_version = ?7,
             language = ?8, importance_score = ?9, origin = ?10, updated_at = ?11
         WHERE url = ?1 AND status = 'scraped'",
        vec![
          text(url),
          text(analysis.summary.as_str()),
          text(tags_str),
          opt_text(analysis.author_intent.as_deref()),
          opt_text(analysis.impact_analysis.as_deref()),
          text(encode_dt(analysis.analyzed_at)),
          text(analysis.model_version.as_str()),
          text(analysis.language.as_str()),
          rusqlite::types::Value::Integer(analysis.importance_score.into()),
          text(analysis.origin.as_str()),
          text(encode_dt(Utc::now())),
        ],
      )
      .await
  }

  // ── Reconciliation ────────────────────────────────────────────────────────

  async fn repair(&self) -> Result<RepairReport> {
    let now_str = encode_dt(Utc::now());

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let content_reset = tx.execute(
          "UPDATE articles
           SET status = 'filtered_in', updated_at = ?2
           WHERE status IN ('scraped', 'analyzed')
             AND (content IS NULL OR TRIM(content) = '' OR content = ?1)",
          rusqlite::params![PLACEHOLDER_CONTENT, now_str],
        )?;

        let tags_reset = tx.execute(
          "UPDATE articles
           SET status = 'scraped', updated_at = ?1
           WHERE status = 'analyzed'
             AND (tags IS NULL OR TRIM(tags) IN ('', '{}'))",
          rusqlite::params![now_str],
        )?;

        tx.commit()?;
        Ok(RepairReport { content_reset, tags_reset })
      })
      .await?;

    if report.content_reset + report.tags_reset > 0 {
      info!(
        content_reset = report.content_reset,
        tags_reset = report.tags_reset,
        "repaired inconsistent articles"
      );
    }
    Ok(report)
  }

  // ── Daily insights ────────────────────────────────────────────────────────

  async fn upsert_daily_insight(&self, insight: &DailyInsight) -> Result<()> {
    let date_str    = encode_date(insight.date);
    let trends_str  = encode_list(&insight.main_trends)?;
    let hidden_str  = encode_list(&insight.hidden_insights)?;
    let topics_str  = encode_list(&insight.hot_topics)?;
    let steering    = insight.media_steering_analysis.clone();
    let sentiment   = insight.market_sentiment_overlay.clone();
    let created_str = encode_dt(insight.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO daily_insights (
             date, main_trends, hidden_insights, hot_topics,
             media_steering_analysis, market_sentiment_overlay, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (date) DO UPDATE SET
             main_trends              = excluded.main_trends,
             hidden_insights          = excluded.hidden_insights,
             hot_topics               = excluded.hot_topics,
             media_steering_analysis  = excluded.media_steering_analysis,
             market_sentiment_overlay = excluded.market_sentiment_overlay,
             created_at               = excluded.created_at",
          rusqlite::params![
            date_str,
            trends_str,
            hidden_str,
            topics_str,
            steering,
            sentiment,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn get_daily_insight(&self, date: NaiveDate) -> Result<Option<DailyInsight>> {
    let date_str = encode_date(date);

    let raw: Option<RawInsight> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {INSIGHT_COLUMNS} FROM daily_insights WHERE date = ?1"),
            rusqlite::params![date_str],
            RawInsight::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawInsight::into_insight).transpose()
  }

  async fn list_daily_insights(&self, limit: usize) -> Result<Vec<DailyInsight>> {
    let limit_val = limit as i64;

    let raws: Vec<RawInsight> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {INSIGHT_COLUMNS} FROM daily_insights ORDER BY date DESC LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], RawInsight::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInsight::into_insight).collect()
  }
}
