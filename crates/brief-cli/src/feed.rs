//! RSS/Atom [`FeedSource`] over HTTP.

use std::time::Duration;

use brief_pipeline::collab::{CollaboratorError, FeedEntry, FeedSource, FetchedFeed};
use chrono::Utc;
use feed_rs::model::Entry;
use reqwest::Client;
use tracing::debug;

const FEED_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RssFeed {
  client: Client,
}

impl RssFeed {
  pub fn new(user_agent: &str) -> anyhow::Result<Self> {
    let client = Client::builder()
      .user_agent(user_agent)
      .timeout(FEED_TIMEOUT)
      .build()?;
    Ok(Self { client })
  }
}

fn entry_image(entry: &Entry) -> Option<String> {
  entry.media.iter().find_map(|media| {
    media
      .thumbnails
      .first()
      .map(|thumb| thumb.image.uri.clone())
      .or_else(|| {
        media
          .content
          .iter()
          .find_map(|c| c.url.as_ref().map(|u| u.to_string()))
      })
  })
}

/// Parse a feed document. Entries without a link are dropped.
pub fn parse_feed(bytes: &[u8]) -> Result<FetchedFeed, CollaboratorError> {
  let feed =
    feed_rs::parser::parse(bytes).map_err(|e| CollaboratorError::Parse(e.to_string()))?;

  let entries = feed
    .entries
    .iter()
    .filter_map(|entry| {
      let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;

      Some(FeedEntry {
        title: entry
          .title
          .as_ref()
          .map(|t| t.content.trim().to_owned())
          .unwrap_or_default(),
        link,
        published: entry
          .published
          .or(entry.updated)
          .map(|dt| dt.with_timezone(&Utc)),
        image_url: entry_image(entry),
      })
    })
    .collect();

  Ok(FetchedFeed { title: feed.title.map(|t| t.content), entries })
}

impl FeedSource for RssFeed {
  async fn fetch(&self, feed_url: &str) -> Result<FetchedFeed, CollaboratorError> {
    let bytes = self
      .client
      .get(feed_url)
      .send()
      .await
      .and_then(reqwest::Response::error_for_status)
      .map_err(CollaboratorError::transport)?
      .bytes()
      .await
      .map_err(CollaboratorError::transport)?;

    let feed = parse_feed(&bytes)?;
    debug!(feed_url, entries = feed.entries.len(), "feed parsed");
    Ok(feed)
  }
}
