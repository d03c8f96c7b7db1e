//! Daily insight — the single aggregate report synthesised per UTC date.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One row per calendar date. Re-synthesis replaces the whole row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInsight {
  pub date:                     NaiveDate,
  pub main_trends:              Vec<String>,
  pub hidden_insights:          Vec<String>,
  pub hot_topics:               Vec<String>,
  pub media_steering_analysis:  Option<String>,
  pub market_sentiment_overlay: Option<String>,
  pub created_at:               DateTime<Utc>,
}
