//! `brief` — the daily news brief pipeline.
//!
//! # Usage
//!
//! ```text
//! brief run                       # ingest → filter → scrape → analyse → insight
//! brief repair                    # reset rows whose stage output is missing
//! brief serve                     # read-only JSON API under /api
//! brief --config /etc/brief.toml run
//! ```

mod config;
mod extract;
mod feed;
mod telegram;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use brief_ai::{CliBackend, EngineRouter};
use brief_core::store::ArticleStore;
use brief_pipeline::{Pipeline, report};
use brief_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{
  config::{AppConfig, expand_tilde},
  extract::HttpExtractor,
  feed::RssFeed,
  telegram::TelegramNotifier,
};

#[derive(Parser)]
#[command(name = "brief", version, about = "Daily AI news brief")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "brief.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Run every pipeline stage once.
  Run,
  /// Move articles with missing content or tags back to the stage that
  /// produces them.
  Repair,
  /// Serve the read-only dashboard API.
  Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = AppConfig::load(&cli.config)?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Run => run(cfg, store).await,
    Command::Repair => repair(store).await,
    Command::Serve => serve(cfg, store).await,
  }
}

async fn run(cfg: AppConfig, store: SqliteStore) -> anyhow::Result<()> {
  if cfg.feeds.is_empty() {
    tracing::warn!("no feeds configured; only pending articles will be processed");
  }

  let engine = EngineRouter::new(
    cfg.engine.policy,
    CliBackend::new(cfg.engine.primary),
    CliBackend::new(cfg.engine.secondary),
  );
  let pipeline = Pipeline {
    store,
    engine,
    feeds: RssFeed::new(&cfg.scrape.user_agent).context("failed to build feed client")?,
    extractor: HttpExtractor::new(&cfg.scrape).context("failed to build scrape client")?,
    notifier: TelegramNotifier::new(&cfg.telegram)
      .context("failed to build telegram client")?,
    feed_list: cfg.feeds,
    config: cfg.pipeline,
    scrape: cfg.scrape,
  };

  let outcome = pipeline.run().await.context("pipeline run failed")?;

  if let (Some(insight), Some(dir)) = (&outcome.insight, &cfg.report_dir) {
    let dir = expand_tilde(dir);
    tokio::fs::create_dir_all(&dir)
      .await
      .with_context(|| format!("failed to create report dir {dir:?}"))?;
    let path = dir.join(report::report_file_name(insight));
    tokio::fs::write(&path, report::render_markdown(insight))
      .await
      .with_context(|| format!("failed to write report {path:?}"))?;
    tracing::info!(path = %path.display(), "markdown report written");
  }

  let s = outcome.summary;
  println!(
    "fetched {} (new {}), filtered in {} / out {}, scraped {} (failed {}), analysed {} \
     (failed {}), insight: {}",
    s.fetched,
    s.new,
    s.filtered_in,
    s.filtered_out,
    s.scraped,
    s.scrape_failed,
    s.analyzed,
    s.analysis_failed,
    if s.insight { "yes" } else { "no" },
  );
  Ok(())
}

async fn repair(store: SqliteStore) -> anyhow::Result<()> {
  let report = store.repair().await.context("repair failed")?;
  println!(
    "reset {} article(s) to filtered_in (missing content), {} to scraped (missing tags)",
    report.content_reset, report.tags_reset
  );
  Ok(())
}

async fn serve(cfg: AppConfig, store: SqliteStore) -> anyhow::Result<()> {
  let app = axum::Router::new()
    .nest("/api", brief_api::api_router(Arc::new(store)))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", cfg.server.host, cfg.server.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
