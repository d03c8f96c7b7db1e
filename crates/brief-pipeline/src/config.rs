//! Pipeline tunables, deserialised from the `[pipeline]`, `[scrape]` and
//! `[[feeds]]` sections of the application config.

use std::time::Duration;

use serde::Deserialize;

/// One feed to poll.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
  pub url:  String,
  /// Display name stored as the article source. Falls back to the feed's own
  /// title, then to the host of `url`.
  #[serde(default)]
  pub name: Option<String>,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// Minimum filter score for an article to be kept.
  pub importance_threshold:  i32,
  pub filter_batch_size:     usize,
  pub analysis_workers:      usize,
  /// Trailing window for the filtering and analysis inputs. `0` disables it.
  pub recency_window_hours:  i64,
  /// Article text beyond this many characters is not sent for analysis.
  pub max_chars_per_article: usize,
  pub filter_model:          Option<String>,
  pub analysis_model:        Option<String>,
  pub insight_model:         Option<String>,
  pub repair_before_run:     bool,
  pub sampling:              SamplingConfig,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      importance_threshold:  7,
      filter_batch_size:     50,
      analysis_workers:      6,
      recency_window_hours:  24,
      max_chars_per_article: 5000,
      filter_model:          Some("gemini-3-flash-preview".into()),
      analysis_model:        Some("gemini-3-pro-preview".into()),
      insight_model:         None,
      repair_before_run:     false,
      sampling:              SamplingConfig::default(),
    }
  }
}

impl PipelineConfig {
  pub fn recency_window(&self) -> Option<chrono::Duration> {
    (self.recency_window_hours > 0)
      .then(|| chrono::Duration::hours(self.recency_window_hours))
  }

  /// The insight model, defaulting to the analysis model.
  pub fn insight_model(&self) -> Option<&str> {
    self
      .insight_model
      .as_deref()
      .or(self.analysis_model.as_deref())
  }
}

/// Debug sampling: bounds how much each stage takes on so a trial run stays
/// cheap.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
  pub enabled: bool,
  pub limit:   usize,
  /// Shuffle before capping instead of taking the first `limit`.
  pub random:  bool,
}

impl Default for SamplingConfig {
  fn default() -> Self { Self { enabled: false, limit: 50, random: false } }
}

impl SamplingConfig {
  /// Cap `items` at `limit` when sampling is enabled.
  pub fn apply<T>(&self, items: &mut Vec<T>, limit: usize) {
    if !self.enabled {
      return;
    }
    if self.random {
      use rand::seq::SliceRandom as _;
      items.shuffle(&mut rand::rng());
    }
    items.truncate(limit);
  }
}

// ─── Scrape ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
  pub workers:            usize,
  /// Extracted text shorter than this many characters is rejected.
  pub min_article_length: usize,
  pub timeout_secs:       u64,
  pub user_agent:         String,
}

impl Default for ScrapeConfig {
  fn default() -> Self {
    Self {
      workers:            5,
      min_article_length: 100,
      timeout_secs:       15,
      user_agent:         "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                           (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .into(),
    }
  }
}

impl ScrapeConfig {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}
