//! Ingestion: poll every feed and dedup-insert its entries as `fetched`.

use brief_core::{article::NewArticle, store::ArticleStore};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  collab::FeedSource,
  config::{FeedConfig, SamplingConfig},
  error::{Error, Result},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOutcome {
  /// Entries seen across all feeds.
  pub fetched:      usize,
  /// Entries whose URL was not stored before.
  pub new:          usize,
  pub failed_feeds: usize,
}

/// The storage key for a feed link: trimmed, without its `#fragment`.
/// Non-HTTP links are rejected.
pub fn canonical_url(link: &str) -> Option<String> {
  let mut url = Url::parse(link.trim()).ok()?;
  if !matches!(url.scheme(), "http" | "https") {
    return None;
  }
  url.set_fragment(None);
  Some(url.into())
}

fn source_name(feed: &FeedConfig, feed_title: Option<&str>) -> String {
  feed
    .name
    .as_deref()
    .or(feed_title)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .or_else(|| {
      Url::parse(&feed.url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
    })
    .unwrap_or_else(|| feed.url.clone())
}

/// Fetch each feed in turn and upsert its entries.
///
/// A feed that fails to fetch is logged and skipped. A store failure aborts.
pub async fn ingest<S, F>(
  store: &S,
  source: &F,
  feeds: &[FeedConfig],
  sampling: &SamplingConfig,
) -> Result<IngestOutcome>
where
  S: ArticleStore,
  F: FeedSource,
{
  let mut outcome = IngestOutcome::default();

  for feed in feeds {
    let fetched = match source.fetch(&feed.url).await {
      Ok(fetched) => fetched,
      Err(error) => {
        warn!(feed = %feed.url, %error, "feed fetch failed");
        outcome.failed_feeds += 1;
        continue;
      }
    };

    let source_name = source_name(feed, fetched.title.as_deref());
    let mut entries = fetched.entries;
    sampling.apply(&mut entries, sampling.limit);

    let mut new_here = 0;
    for entry in &entries {
      let Some(url) = canonical_url(&entry.link) else {
        debug!(feed = %feed.url, link = %entry.link, "skipping entry without a usable link");
        continue;
      };
      outcome.fetched += 1;

      let created = store
        .upsert_fetched(NewArticle {
          url,
          title: entry.title.trim().to_owned(),
          source: source_name.clone(),
          published_at: entry.published,
          image_url: entry.image_url.clone(),
        })
        .await
        .map_err(Error::store)?;
      if created {
        new_here += 1;
      }
    }

    outcome.new += new_here;
    info!(feed = %feed.url, entries = entries.len(), new = new_here, "feed ingested");
  }

  info!(
    fetched = outcome.fetched,
    new = outcome.new,
    failed_feeds = outcome.failed_feeds,
    "ingestion finished"
  );
  Ok(outcome)
}
