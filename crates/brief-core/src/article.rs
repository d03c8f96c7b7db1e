//! Article records and the status state machine they move through.
//!
//! An article is keyed by its canonical URL. It is created by ingestion with
//! status [`ArticleStatus::Fetched`] and advanced forward by the filtering,
//! scraping and analysis stages. The pipeline never deletes articles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Position of an article in the pipeline.
///
/// ```text
/// fetched ─┬─▶ filtered_in ─▶ scraped ─▶ analyzed
///          └─▶ filtered_out
/// ```
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArticleStatus {
  Fetched,
  FilteredIn,
  FilteredOut,
  Scraped,
  Analyzed,
}

impl ArticleStatus {
  /// The exact literal stored in the `status` column.
  pub fn as_str(self) -> &'static str { self.into() }

  /// Parse a stored status literal.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, Self::FilteredOut | Self::Analyzed)
  }

  /// Statuses reachable from `self` by a single forward transition.
  pub fn successors(self) -> &'static [ArticleStatus] {
    match self {
      Self::Fetched => &[Self::FilteredIn, Self::FilteredOut],
      Self::FilteredIn => &[Self::Scraped],
      Self::Scraped => &[Self::Analyzed],
      Self::FilteredOut | Self::Analyzed => &[],
    }
  }

  pub fn can_advance_to(self, next: ArticleStatus) -> bool {
    self.successors().contains(&next)
  }
}

// ─── Tags ────────────────────────────────────────────────────────────────────

/// Market sentiment an analysis attributes to an article.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sentiment {
  Positive,
  Negative,
  Neutral,
  #[default]
  Unknown,
}

impl Sentiment {
  /// Normalise a free-form label produced by a model.
  ///
  /// Accepts the English names (any case) and the Vietnamese labels used by
  /// the Vietnamese-language prompts. Anything else maps to `Unknown`.
  pub fn from_label(label: &str) -> Self {
    let label = label.trim();
    match label.to_lowercase().as_str() {
      "positive" | "tích cực" => Self::Positive,
      "negative" | "tiêu cực" => Self::Negative,
      "neutral" | "trung lập" => Self::Neutral,
      _ => Self::Unknown,
    }
  }
}

/// Structured tags extracted by analysis; stored as one JSON column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleTags {
  #[serde(default)]
  pub source:    Option<String>,
  #[serde(default)]
  pub sectors:   Vec<String>,
  #[serde(default)]
  pub entities:  Vec<String>,
  #[serde(default)]
  pub people:    Vec<String>,
  #[serde(default)]
  pub locations: Vec<String>,
  #[serde(default)]
  pub keywords:  Vec<String>,
  #[serde(default)]
  pub sentiment: Sentiment,
}

// ─── Article ─────────────────────────────────────────────────────────────────

/// A persisted article row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
  pub url:              String,
  pub title:            String,
  pub source:           String,
  pub published_date:   Option<DateTime<Utc>>,
  pub image_url:        Option<String>,
  pub status:           ArticleStatus,
  pub filter_score:     Option<i32>,
  pub filter_reason:    Option<String>,
  pub content:          Option<String>,
  pub scraped_at:       Option<DateTime<Utc>>,
  pub summary:          Option<String>,
  pub tags:             Option<ArticleTags>,
  pub author_intent:    Option<String>,
  pub impact_analysis:  Option<String>,
  pub analyzed_at:      Option<DateTime<Utc>>,
  pub model_version:    Option<String>,
  pub language:         Option<String>,
  pub importance_score: Option<u8>,
  pub origin:           Option<String>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

// ─── Write inputs ────────────────────────────────────────────────────────────

/// Input to [`ArticleStore::upsert_fetched`](crate::store::ArticleStore::upsert_fetched).
#[derive(Debug, Clone)]
pub struct NewArticle {
  /// Canonical URL; the primary key.
  pub url:          String,
  pub title:        String,
  pub source:       String,
  pub published_at: Option<DateTime<Utc>>,
  pub image_url:    Option<String>,
}

/// Validated output of the analysis stage for one article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
  pub summary:          String,
  pub tags:             ArticleTags,
  pub author_intent:    Option<String>,
  pub impact_analysis:  Option<String>,
  pub language:         String,
  pub importance_score: u8,
  pub origin:           String,
  pub model_version:    String,
  pub analyzed_at:      DateTime<Utc>,
}
