//! Interfaces to the external systems the pipeline consumes.
//!
//! Concrete implementations (RSS over HTTP, readability extraction, Telegram)
//! live in the binary; tests use in-process fakes.

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A failure reported by a collaborator. Never run-fatal.
#[derive(Debug, Error)]
pub enum CollaboratorError {
  #[error("transport error: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("unparsable payload: {0}")]
  Parse(String),

  #[error("rejected: {0}")]
  Rejected(String),
}

impl CollaboratorError {
  pub fn transport<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    CollaboratorError::Transport(Box::new(e))
  }
}

// ─── Feeds ───────────────────────────────────────────────────────────────────

/// One entry of a fetched feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
  pub title:     String,
  pub link:      String,
  pub published: Option<DateTime<Utc>>,
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FetchedFeed {
  /// The feed's own title, if it declares one.
  pub title:   Option<String>,
  pub entries: Vec<FeedEntry>,
}

pub trait FeedSource: Send + Sync {
  fn fetch<'a>(
    &'a self,
    feed_url: &'a str,
  ) -> impl Future<Output = Result<FetchedFeed, CollaboratorError>> + Send + 'a;
}

// ─── Content extraction ──────────────────────────────────────────────────────

/// Main text of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
  pub text:  String,
  pub title: Option<String>,
}

pub trait ContentExtractor: Send + Sync {
  fn extract<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<ExtractedPage, CollaboratorError>> + Send + 'a;
}

// ─── Notifications ───────────────────────────────────────────────────────────

pub trait Notifier: Send + Sync {
  fn notify<'a>(
    &'a self,
    message: &'a str,
  ) -> impl Future<Output = Result<(), CollaboratorError>> + Send + 'a;
}

/// Drops every message. Used when no notification channel is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
  async fn notify(&self, _message: &str) -> Result<(), CollaboratorError> { Ok(()) }
}
