//! [`Pipeline`] — runs the stages once, in order.

use brief_ai::Engine;
use brief_core::{
  article::ArticleStatus,
  insight::DailyInsight,
  store::{ArticleStore, RepairReport},
};
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::{
  analyze::analyze,
  collab::{ContentExtractor, FeedSource, Notifier},
  config::{FeedConfig, PipelineConfig, ScrapeConfig},
  error::{Error, Result},
  filter::filter,
  ingest::ingest,
  insight::synthesize,
  report::notification_message,
  scrape::scrape,
};

/// Per-stage counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub fetched:         usize,
  pub new:             usize,
  pub filtered_in:     usize,
  pub filtered_out:    usize,
  pub scraped:         usize,
  pub scrape_failed:   usize,
  pub analyzed:        usize,
  pub analysis_failed: usize,
  pub insight:         bool,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
  pub summary: RunSummary,
  /// The insight stored by this run, if synthesis succeeded.
  pub insight: Option<DailyInsight>,
  /// Set when the run stopped after ingestion with nothing to do.
  pub quiet:   bool,
}

/// The pipeline and its collaborators.
pub struct Pipeline<S, E, F, X, N> {
  pub store:     S,
  pub engine:    E,
  pub feeds:     F,
  pub extractor: X,
  pub notifier:  N,
  pub feed_list: Vec<FeedConfig>,
  pub config:    PipelineConfig,
  pub scrape:    ScrapeConfig,
}

impl<S, E, F, X, N> Pipeline<S, E, F, X, N>
where
  S: ArticleStore,
  E: Engine,
  F: FeedSource,
  X: ContentExtractor,
  N: Notifier,
{
  /// Move rows with missing stage output back to the stage that produces it.
  pub async fn repair(&self) -> Result<RepairReport> {
    let report = self.store.repair().await.map_err(Error::store)?;
    info!(
      content_reset = report.content_reset,
      tags_reset = report.tags_reset,
      "repair finished"
    );
    Ok(report)
  }

  /// Articles waiting in a non-terminal, pre-analysis status.
  async fn pending(&self) -> Result<u64> {
    let window = self.config.recency_window();
    let mut pending = 0;
    for (status, window) in [
      (ArticleStatus::Fetched, window),
      (ArticleStatus::FilteredIn, None),
      (ArticleStatus::Scraped, window),
    ] {
      pending += self
        .store
        .count_by_status(status, window)
        .await
        .map_err(Error::store)?;
    }
    Ok(pending)
  }

  /// Run every stage once, stamping the insight with today's UTC date.
  pub async fn run(&self) -> Result<RunReport> {
    self.run_for(Utc::now().date_naive()).await
  }

  /// Run every stage once, stamping the insight with `date`.
  pub async fn run_for(&self, date: NaiveDate) -> Result<RunReport> {
    info!(%date, sampling = self.config.sampling.enabled, "pipeline run starting");
    let mut report = RunReport::default();
    let summary = &mut report.summary;

    if self.config.repair_before_run {
      self.repair().await?;
    }

    let ingested = ingest(&self.store, &self.feeds, &self.feed_list, &self.config.sampling).await?;
    summary.fetched = ingested.fetched;
    summary.new = ingested.new;

    let pending = self.pending().await?;
    if ingested.new == 0 && pending == 0 && !self.config.sampling.enabled {
      info!("nothing new and nothing pending; stopping early");
      report.quiet = true;
      return Ok(report);
    }
    if pending > 0 {
      info!(pending, "articles waiting from earlier runs");
    }

    let filtered = filter(&self.store, &self.engine, &self.config).await?;
    summary.filtered_in = filtered.selected.len();
    summary.filtered_out = filtered.rejected;

    let scraped = scrape(&self.store, &self.extractor, &self.scrape, &self.config.sampling).await?;
    summary.scraped = scraped.scraped.len();
    summary.scrape_failed = scraped.failed;

    let analyzed = analyze(&self.store, &self.engine, &self.config).await?;
    summary.analyzed = analyzed.analyzed.len();
    summary.analysis_failed = analyzed.failed;

    let insight =
      synthesize(&self.store, &self.engine, &analyzed.analyzed, &self.config, date).await?;
    summary.insight = insight.is_some();

    if let Some(insight) = &insight {
      let message = notification_message(insight, summary.analyzed);
      if let Err(error) = self.notifier.notify(&message).await {
        warn!(%error, "notification failed");
      }
    }

    info!(
      fetched = summary.fetched,
      new = summary.new,
      filtered_in = summary.filtered_in,
      filtered_out = summary.filtered_out,
      scraped = summary.scraped,
      scrape_failed = summary.scrape_failed,
      analyzed = summary.analyzed,
      analysis_failed = summary.analysis_failed,
      insight = summary.insight,
      "pipeline run finished"
    );
    report.insight = insight;
    Ok(report)
  }
}
