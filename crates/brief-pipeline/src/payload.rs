//! Typed schemas for model answers.
//!
//! Answers are validated here, immediately on receipt. A payload that does not
//! fit is rejected as a whole and the article stays at its current status.

use brief_ai::util::strip_code_blocks;
use brief_core::{
  article::{AnalysisResult, ArticleTags, Sentiment},
  insight::DailyInsight,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PayloadError {
  #[error("answer is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("expected a JSON array")]
  NotAnArray,

  #[error("expected a JSON object")]
  NotAnObject,

  #[error("invalid payload: {0}")]
  Invalid(String),
}

/// Parse the first JSON value that starts at `open`. Prose before it is
/// skipped and anything after it is ignored.
fn first_value(answer: &str, open: char) -> Option<Result<Value, serde_json::Error>> {
  let answer = strip_code_blocks(answer);
  let start = answer.find(open)?;
  serde_json::Deserializer::from_str(&answer[start..])
    .into_iter::<Value>()
    .next()
}

/// Models sometimes answer `null` for an empty list or use numbers as labels.
fn list(value: Option<Vec<Value>>) -> Vec<String> {
  value
    .unwrap_or_default()
    .into_iter()
    .filter_map(|v| match v {
      Value::String(s) => Some(s.trim().to_owned()),
      Value::Number(n) => Some(n.to_string()),
      _ => None,
    })
    .filter(|s| !s.is_empty())
    .collect()
}

fn text(value: Option<String>) -> Option<String> {
  value
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
}

// ─── Filter verdicts ─────────────────────────────────────────────────────────

/// One scored item of a filtering answer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterVerdict {
  pub id:     u64,
  #[serde(default)]
  pub score:  f64,
  #[serde(default)]
  pub reason: Option<String>,
}

impl FilterVerdict {
  /// Compares the score as given; no rounding.
  pub fn meets(&self, threshold: i32) -> bool { self.score >= f64::from(threshold) }

  /// Integer form for storage.
  pub fn rounded_score(&self) -> i32 { self.score.round() as i32 }
}

/// Parse a filtering answer element by element.
///
/// A non-array answer is an error; malformed elements are dropped.
pub fn parse_verdicts(answer: &str) -> Result<Vec<FilterVerdict>, PayloadError> {
  let value = first_value(answer, '[').ok_or(PayloadError::NotAnArray)??;
  let Value::Array(items) = value else {
    return Err(PayloadError::NotAnArray);
  };

  Ok(
    items
      .into_iter()
      .filter_map(|item| match serde_json::from_value::<FilterVerdict>(item) {
        Ok(verdict) => Some(verdict),
        Err(error) => {
          debug!(%error, "dropping malformed verdict");
          None
        }
      })
      .collect(),
  )
}

// ─── Analysis ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct TagsPayload {
  source:    Option<String>,
  sectors:   Option<Vec<Value>>,
  entities:  Option<Vec<Value>>,
  people:    Option<Vec<Value>>,
  locations: Option<Vec<Value>>,
  keywords:  Option<Vec<Value>>,
  sentiment: Option<String>,
}

impl From<TagsPayload> for ArticleTags {
  fn from(t: TagsPayload) -> Self {
    ArticleTags {
      source:    text(t.source),
      sectors:   list(t.sectors),
      entities:  list(t.entities),
      people:    list(t.people),
      locations: list(t.locations),
      keywords:  list(t.keywords),
      sentiment: t
        .sentiment
        .as_deref()
        .map(Sentiment::from_label)
        .unwrap_or_default(),
    }
  }
}

/// The per-article object requested by the analysis prompt.
#[derive(Debug, Deserialize)]
pub struct AnalysisPayload {
  summary:          Option<String>,
  language:         Option<String>,
  importance_score: Option<f64>,
  origin:           Option<String>,
  tags:             Option<TagsPayload>,
  author_intent:    Option<String>,
  impact_analysis:  Option<String>,
}

impl AnalysisPayload {
  pub fn parse(answer: &str) -> Result<Self, PayloadError> {
    let value = first_value(answer, '{').ok_or(PayloadError::NotAnObject)??;
    Ok(serde_json::from_value(value)?)
  }

  /// Validate and apply defaults.
  pub fn into_result(
    self,
    model_version: impl Into<String>,
    analyzed_at: DateTime<Utc>,
  ) -> Result<AnalysisResult, PayloadError> {
    let summary = text(self.summary)
      .ok_or_else(|| PayloadError::Invalid("summary is empty".into()))?;

    let score = self.importance_score.unwrap_or(5.0).round();
    if !(0.0..=10.0).contains(&score) {
      return Err(PayloadError::Invalid(format!(
        "importance_score {score} is outside 0..=10"
      )));
    }

    Ok(AnalysisResult {
      summary,
      tags: self.tags.unwrap_or_default().into(),
      author_intent: text(self.author_intent),
      impact_analysis: text(self.impact_analysis),
      language: text(self.language).unwrap_or_else(|| "vi".into()),
      importance_score: score as u8,
      origin: text(self.origin).unwrap_or_else(|| "VN".into()),
      model_version: model_version.into(),
      analyzed_at,
    })
  }
}

// ─── Insight ─────────────────────────────────────────────────────────────────

/// The aggregate object requested by the insight prompt. Any `date` the model
/// echoes back is ignored.
#[derive(Debug, Deserialize)]
pub struct InsightPayload {
  main_trends:              Option<Vec<Value>>,
  hidden_insights:          Option<Vec<Value>>,
  hot_topics:               Option<Vec<Value>>,
  media_steering_analysis:  Option<String>,
  market_sentiment_overlay: Option<String>,
}

impl InsightPayload {
  pub fn parse(answer: &str) -> Result<Self, PayloadError> {
    let value = first_value(answer, '{').ok_or(PayloadError::NotAnObject)??;
    Ok(serde_json::from_value(value)?)
  }

  pub fn into_insight(
    self,
    date: NaiveDate,
    created_at: DateTime<Utc>,
  ) -> Result<DailyInsight, PayloadError> {
    let main_trends = list(self.main_trends);
    let hot_topics = list(self.hot_topics);
    if main_trends.is_empty() && hot_topics.is_empty() {
      return Err(PayloadError::Invalid(
        "neither main_trends nor hot_topics is present".into(),
      ));
    }

    Ok(DailyInsight {
      date,
      main_trends,
      hidden_insights: list(self.hidden_insights),
      hot_topics,
      media_steering_analysis: text(self.media_steering_analysis),
      market_sentiment_overlay: text(self.market_sentiment_overlay),
      created_at,
    })
  }
}
