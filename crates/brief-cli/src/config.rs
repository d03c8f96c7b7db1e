//! Application configuration, read from `brief.toml` and `BRIEF_*` variables.
//!
//! Nested keys use `__` in the environment, e.g.
//! `BRIEF_TELEGRAM__BOT_TOKEN` or `BRIEF_ENGINE__POLICY=hybrid`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use brief_ai::{CliBackendConfig, CliFlavor, EnginePolicy};
use brief_pipeline::{FeedConfig, PipelineConfig, ScrapeConfig};
use serde::Deserialize;

// ─── Root ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Directory for `daily_report_<date>.md`; no report file when unset.
  #[serde(default)]
  pub report_dir: Option<PathBuf>,
  #[serde(default)]
  pub feeds:      Vec<FeedConfig>,
  #[serde(default)]
  pub engine:     EngineConfig,
  #[serde(default)]
  pub pipeline:   PipelineConfig,
  #[serde(default)]
  pub scrape:     ScrapeConfig,
  #[serde(default)]
  pub telegram:   TelegramConfig,
  #[serde(default)]
  pub server:     ServerConfig,
}

fn default_store_path() -> PathBuf { PathBuf::from("brief.db") }

impl AppConfig {
  /// Layer the optional TOML file under `BRIEF_*` environment variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("BRIEF")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise AppConfig")
  }
}

// ─── Engine ───────────────────────────────────────────────────────────────────

/// `[engine]`: routing policy plus one table per backend.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  #[serde(default)]
  pub policy:    EnginePolicy,
  #[serde(default = "default_primary")]
  pub primary:   CliBackendConfig,
  #[serde(default = "default_secondary")]
  pub secondary: CliBackendConfig,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      policy:    EnginePolicy::default(),
      primary:   default_primary(),
      secondary: default_secondary(),
    }
  }
}

fn default_primary() -> CliBackendConfig {
  CliBackendConfig {
    flavor:        CliFlavor::Gemini,
    program:       PathBuf::from("gemini"),
    default_model: "gemini-3-pro-preview".into(),
    timeout_secs:  300,
  }
}

fn default_secondary() -> CliBackendConfig {
  CliBackendConfig {
    flavor:        CliFlavor::Codex,
    program:       PathBuf::from("codex"),
    default_model: "gpt-5.2".into(),
    timeout_secs:  300,
  }
}

// ─── Telegram ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
  pub enabled:       bool,
  pub bot_token:     Option<String>,
  pub chat_id:       Option<String>,
  /// Appended to each message as a link, when set.
  pub dashboard_url: Option<String>,
}

impl Default for TelegramConfig {
  fn default() -> Self {
    Self { enabled: true, bot_token: None, chat_id: None, dashboard_url: None }
  }
}

// ─── Server ───────────────────────────────────────────────────────────────────

/// `[server]`, used by `brief serve`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host: String,
  pub port: u16,
}

impl Default for ServerConfig {
  fn default() -> Self { Self { host: "127.0.0.1".into(), port: 8080 } }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn from_toml(toml: &str) -> AppConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = from_toml("");
    assert_eq!(cfg.store_path, PathBuf::from("brief.db"));
    assert!(cfg.feeds.is_empty());
    assert_eq!(cfg.engine.policy, EnginePolicy::Primary);
    assert_eq!(cfg.engine.primary.flavor, CliFlavor::Gemini);
    assert_eq!(cfg.engine.secondary.default_model, "gpt-5.2");
    assert_eq!(cfg.pipeline.importance_threshold, 7);
    assert_eq!(cfg.scrape.min_article_length, 100);
    assert!(cfg.telegram.enabled);
    assert_eq!(cfg.server.port, 8080);
  }

  #[test]
  fn full_file() {
    let cfg = from_toml(
      r#"
store_path = "/var/lib/brief/brief.db"
report_dir = "reports"

[[feeds]]
url = "https://vnexpress.net/rss/kinh-doanh.rss"
name = "VnExpress"

[[feeds]]
url = "https://rss.nytimes.com/services/xml/rss/nyt/Business.xml"

[engine]
policy = "hybrid"

[engine.secondary]
flavor = "codex"
program = "/usr/local/bin/codex"
default_model = "gpt-5.2"
timeout_secs = 120

[pipeline]
importance_threshold = 8
recency_window_hours = 48

[pipeline.sampling]
enabled = true
limit = 5

[scrape]
workers = 3
"#,
    );
    assert_eq!(cfg.report_dir, Some(PathBuf::from("reports")));
    assert_eq!(cfg.feeds.len(), 2);
    assert_eq!(cfg.feeds[0].name.as_deref(), Some("VnExpress"));
    assert_eq!(cfg.engine.policy, EnginePolicy::Hybrid);
    assert_eq!(cfg.engine.primary.program, PathBuf::from("gemini"));
    assert_eq!(cfg.engine.secondary.timeout_secs, 120);
    assert_eq!(cfg.pipeline.importance_threshold, 8);
    assert_eq!(cfg.pipeline.filter_batch_size, 50);
    assert!(cfg.pipeline.sampling.enabled);
    assert_eq!(cfg.pipeline.sampling.limit, 5);
    assert_eq!((cfg.scrape.workers, cfg.scrape.timeout_secs), (3, 15));
  }

  #[test]
  fn legacy_engine_names_are_accepted() {
    let cfg = from_toml("[engine]\npolicy = \"codex\"\n");
    assert_eq!(cfg.engine.policy, EnginePolicy::Secondary);
  }
}
