//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that lexical comparison in SQL matches chronological order.
//! Dates are `YYYY-MM-DD`. Tags and insight lists are compact JSON.

use brief_core::{
  article::{Article, ArticleStatus, ArticleTags},
  insight::DailyInsight,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &ArticleTags) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

/// Legacy rows may hold `{}` or partial objects; missing fields default.
fn decode_tags(s: &str) -> Result<ArticleTags> { Ok(serde_json::from_str(s)?) }

pub fn encode_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawArticle::from_row`].
pub const ARTICLE_COLUMNS: &str = "url, title, source, published_date, \
   image_url, status, filter_score, filter_reason, content, scraped_at, \
   summary, tags, author_intent, impact_analysis, analyzed_at, model_version, \
   language, importance_score, origin, created_at, updated_at";

/// Raw values read directly from an `articles` row.
pub struct RawArticle {
  pub url:              String,
  pub title:            String,
  pub source:           String,
  pub published_date:   Option<String>,
  pub image_url:        Option<String>,
  pub status:           String,
  pub filter_score:     Option<i32>,
  pub filter_reason:    Option<String>,
  pub content:          Option<String>,
  pub scraped_at:       Option<String>,
  pub summary:          Option<String>,
  pub tags:             Option<String>,
  pub author_intent:    Option<String>,
  pub impact_analysis:  Option<String>,
  pub analyzed_at:      Option<String>,
  pub model_version:    Option<String>,
  pub language:         Option<String>,
  pub importance_score: Option<i64>,
  pub origin:           Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawArticle {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      url:              row.get(0)?,
      title:            row.get(1)?,
      source:           row.get(2)?,
      published_date:   row.get(3)?,
      image_url:        row.get(4)?,
      status:           row.get(5)?,
      filter_score:     row.get(6)?,
      filter_reason:    row.get(7)?,
      content:          row.get(8)?,
      scraped_at:       row.get(9)?,
      summary:          row.get(10)?,
      tags:             row.get(11)?,
      author_intent:    row.get(12)?,
      impact_analysis:  row.get(13)?,
      analyzed_at:      row.get(14)?,
      model_version:    row.get(15)?,
      language:         row.get(16)?,
      importance_score: row.get(17)?,
      origin:           row.get(18)?,
      created_at:       row.get(19)?,
      updated_at:       row.get(20)?,
    })
  }

  pub fn into_article(self) -> Result<Article> {
    let importance_score = self
      .importance_score
      .map(|s| u8::try_from(s).map_err(|_| Error::ScoreRange(s)))
      .transpose()?;

    Ok(Article {
      url: self.url,
      title: self.title,
      source: self.source,
      published_date: decode_opt_dt(self.published_date)?,
      image_url: self.image_url,
      status: ArticleStatus::parse(&self.status)?,
      filter_score: self.filter_score,
      filter_reason: self.filter_reason,
      content: self.content,
      scraped_at: decode_opt_dt(self.scraped_at)?,
      summary: self.summary,
      tags: self.tags.as_deref().map(decode_tags).transpose()?,
      author_intent: self.author_intent,
      impact_analysis: self.impact_analysis,
      analyzed_at: decode_opt_dt(self.analyzed_at)?,
      model_version: self.model_version,
      language: self.language,
      importance_score,
      origin: self.origin,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawInsight::from_row`].
pub const INSIGHT_COLUMNS: &str = "date, main_trends, hidden_insights, \
   hot_topics, media_steering_analysis, market_sentiment_overlay, created_at";

/// Raw values read directly from a `daily_insights` row.
pub struct RawInsight {
  pub date:                     String,
  pub main_trends:              String,
  pub hidden_insights:          String,
  pub hot_topics:               String,
  pub media_steering_analysis:  Option<String>,
  pub market_sentiment_overlay: Option<String>,
  pub created_at:               String,
}

impl RawInsight {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      date:                     row.get(0)?,
      main_trends:              row.get(1)?,
      hidden_insights:          row.get(2)?,
      hot_topics:               row.get(3)?,
      media_steering_analysis:  row.get(4)?,
      market_sentiment_overlay: row.get(5)?,
      created_at:               row.get(6)?,
    })
  }

  pub fn into_insight(self) -> Result<DailyInsight> {
    Ok(DailyInsight {
      date:                     decode_date(&self.date)?,
      main_trends:              decode_list(&self.main_trends)?,
      hidden_insights:          decode_list(&self.hidden_insights)?,
      hot_topics:               decode_list(&self.hot_topics)?,
      media_steering_analysis:  self.media_steering_analysis,
      market_sentiment_overlay: self.market_sentiment_overlay,
      created_at:               decode_dt(&self.created_at)?,
    })
  }
}
