//! Scraping: fetch the main text of every `filtered_in` article.
//!
//! Pages are extracted concurrently by a bounded pool. Results are gathered
//! first and persisted afterwards, one at a time, so the store never sees
//! concurrent writers from this stage.

use std::time::Duration;

use brief_core::{article::ArticleStatus, store::ArticleStore};
use futures::{StreamExt as _, stream};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  collab::{CollaboratorError, ContentExtractor},
  config::{SamplingConfig, ScrapeConfig},
  error::{Error, Result},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeOutcome {
  pub attempted: usize,
  /// URLs moved to `scraped` by this run.
  pub scraped:   Vec<String>,
  /// Attempts that left the article at `filtered_in`.
  pub failed:    usize,
}

/// Why a page was not accepted.
#[derive(Debug, Error)]
pub enum ScrapeFailure {
  #[error("timed out after {0:?}")]
  Timeout(Duration),

  #[error(transparent)]
  Extract(#[from] CollaboratorError),

  #[error("content too short ({chars} < {floor} chars)")]
  TooShort { chars: usize, floor: usize },
}

/// One worker's result.
#[derive(Debug)]
pub struct ScrapeAttempt {
  pub url:     String,
  pub content: Result<String, ScrapeFailure>,
}

async fn scrape_one<X: ContentExtractor>(
  extractor: &X,
  url: String,
  timeout: Duration,
  floor: usize,
) -> ScrapeAttempt {
  let content = match tokio::time::timeout(timeout, extractor.extract(&url)).await {
    Err(_) => Err(ScrapeFailure::Timeout(timeout)),
    Ok(Err(e)) => Err(e.into()),
    Ok(Ok(page)) => {
      let text = page.text.trim().to_owned();
      let chars = text.chars().count();
      if chars < floor {
        Err(ScrapeFailure::TooShort { chars, floor })
      } else {
        Ok(text)
      }
    }
  };
  ScrapeAttempt { url, content }
}

/// Extract every `filtered_in` article with `config.workers` concurrent
/// workers, then persist the accepted ones.
pub async fn scrape<S, X>(
  store: &S,
  extractor: &X,
  config: &ScrapeConfig,
  sampling: &SamplingConfig,
) -> Result<ScrapeOutcome>
where
  S: ArticleStore,
  X: ContentExtractor,
{
  let mut articles = store
    .select_by_status(ArticleStatus::FilteredIn, None)
    .await
    .map_err(Error::store)?;
  sampling.apply(&mut articles, sampling.limit);

  let mut outcome = ScrapeOutcome { attempted: articles.len(), ..Default::default() };
  if articles.is_empty() {
    info!("no filtered articles to scrape");
    return Ok(outcome);
  }
  info!(articles = articles.len(), workers = config.workers, "scraping");

  let timeout = config.timeout();
  let floor = config.min_article_length;
  let attempts: Vec<ScrapeAttempt> = stream::iter(
    articles
      .into_iter()
      .map(|article| scrape_one(extractor, article.url, timeout, floor)),
  )
  .buffer_unordered(config.workers.max(1))
  .collect()
  .await;

  for attempt in attempts {
    let content = match attempt.content {
      Ok(content) => content,
      Err(error) => {
        warn!(url = %attempt.url, %error, "scrape failed; will retry next run");
        outcome.failed += 1;
        continue;
      }
    };

    let applied = store
      .update_scrape_result(&attempt.url, &content)
      .await
      .map_err(Error::store)?;
    if applied {
      debug!(url = %attempt.url, chars = content.chars().count(), "scraped");
      outcome.scraped.push(attempt.url);
    } else {
      debug!(url = %attempt.url, "article left filtered_in meanwhile; content dropped");
    }
  }

  info!(scraped = outcome.scraped.len(), failed = outcome.failed, "scraping finished");
  Ok(outcome)
}

#[cfg(test)]
mod tests {
  use brief_core::store::ArticleStore;

  use super::*;
  use crate::testing::{FakeExtractor, new_article, store};

  async fn seed_filtered_in(s: &impl ArticleStore, url: &str) {
    s.upsert_fetched(new_article(url, "t")).await.unwrap();
    s.update_filter_result(url, ArticleStatus::FilteredIn, 8, "r")
      .await
      .unwrap();
  }

  async fn status(s: &impl ArticleStore, url: &str) -> ArticleStatus {
    s.get_article(url).await.unwrap().unwrap().status
  }

  #[tokio::test]
  async fn length_floor_boundary() {
    let s = store().await;
    seed_filtered_in(&s, "https://a/short").await;
    seed_filtered_in(&s, "https://a/exact").await;
    let extractor = FakeExtractor::default()
      .page("https://a/short", "ạ".repeat(99))
      .page("https://a/exact", "ạ".repeat(100));

    let outcome = scrape(&s, &extractor, &ScrapeConfig::default(), &SamplingConfig::default())
      .await
      .unwrap();

    assert_eq!(outcome.attempted, 2);
    assert_eq!(outcome.scraped, vec!["https://a/exact"]);
    assert_eq!(outcome.failed, 1);
    assert_eq!(status(&s, "https://a/short").await, ArticleStatus::FilteredIn);
    assert_eq!(status(&s, "https://a/exact").await, ArticleStatus::Scraped);

    let exact = s.get_article("https://a/exact").await.unwrap().unwrap();
    assert_eq!(exact.content.as_deref().map(|c| c.chars().count()), Some(100));
    assert!(exact.scraped_at.is_some());
  }

  #[tokio::test]
  async fn failures_do_not_affect_peers() {
    let s = store().await;
    for url in ["https://b/ok", "https://b/missing", "https://b/slow"] {
      seed_filtered_in(&s, url).await;
    }
    let extractor = FakeExtractor::default()
      .page("https://b/ok", "x".repeat(500))
      .hanging("https://b/slow");
    let config = ScrapeConfig { timeout_secs: 1, ..Default::default() };

    let outcome = scrape(&s, &extractor, &config, &SamplingConfig::default())
      .await
      .unwrap();

    assert_eq!(outcome.scraped, vec!["https://b/ok"]);
    assert_eq!(outcome.failed, 2);
    assert_eq!(status(&s, "https://b/missing").await, ArticleStatus::FilteredIn);
    assert_eq!(status(&s, "https://b/slow").await, ArticleStatus::FilteredIn);
  }

  #[tokio::test]
  async fn sampling_caps_scrape_input() {
    let s = store().await;
    let mut extractor = FakeExtractor::default();
    for i in 0..4 {
      let url = format!("https://c/{i}");
      seed_filtered_in(&s, &url).await;
      extractor = extractor.page(&url, "y".repeat(200));
    }
    let sampling = SamplingConfig { enabled: true, limit: 3, random: true };

    let outcome = scrape(&s, &extractor, &ScrapeConfig::default(), &sampling)
      .await
      .unwrap();
    assert_eq!(outcome.attempted, 3);
    assert_eq!(outcome.scraped.len(), 3);
  }
}
