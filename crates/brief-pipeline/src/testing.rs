//! In-process fakes shared by the stage tests.

use std::{
  collections::{HashMap, VecDeque},
  sync::Mutex,
};

use brief_ai::{Completion, Engine, Purpose};
use brief_core::article::{Article, ArticleStatus, NewArticle};
use brief_store_sqlite::SqliteStore;
use chrono::{Duration, Utc};

use crate::collab::{
  CollaboratorError, ContentExtractor, ExtractedPage, FeedEntry, FeedSource, FetchedFeed,
  Notifier,
};

pub async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

pub fn new_article(url: &str, title: &str) -> NewArticle {
  NewArticle {
    url:          url.into(),
    title:        title.into(),
    source:       "cafef.vn".into(),
    published_at: Some(Utc::now() - Duration::hours(1)),
    image_url:    None,
  }
}

/// A detached `fetched` article, for prompt and report tests.
pub fn article(url: &str, title: &str) -> Article {
  let now = Utc::now();
  Article {
    url:              url.into(),
    title:            title.into(),
    source:           "cafef.vn".into(),
    published_date:   Some(now),
    image_url:        None,
    status:           ArticleStatus::Fetched,
    filter_score:     None,
    filter_reason:    None,
    content:          None,
    scraped_at:       None,
    summary:          None,
    tags:             None,
    author_intent:    None,
    impact_analysis:  None,
    analyzed_at:      None,
    model_version:    None,
    language:         None,
    importance_score: None,
    origin:           None,
    created_at:       now,
    updated_at:       now,
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

type Responder = Box<dyn Fn(Purpose, &str) -> Option<String> + Send + Sync>;

/// Answers from a per-purpose queue, then from an optional responder
/// closure. Records every prompt it receives.
#[derive(Default)]
pub struct ScriptedEngine {
  queued:    Mutex<HashMap<String, VecDeque<Option<String>>>>,
  responder: Option<Responder>,
  prompts:   Mutex<Vec<(Purpose, String)>>,
}

impl ScriptedEngine {
  pub fn new() -> Self { Self::default() }

  pub fn respond_with(
    f: impl Fn(Purpose, &str) -> Option<String> + Send + Sync + 'static,
  ) -> Self {
    Self { responder: Some(Box::new(f)), ..Self::default() }
  }

  pub fn queue(self, purpose: Purpose, answer: Option<&str>) -> Self {
    self
      .queued
      .lock()
      .unwrap()
      .entry(purpose.to_string())
      .or_default()
      .push_back(answer.map(str::to_owned));
    self
  }

  pub fn prompts(&self, purpose: Purpose) -> Vec<String> {
    self
      .prompts
      .lock()
      .unwrap()
      .iter()
      .filter(|(p, _)| *p == purpose)
      .map(|(_, prompt)| prompt.clone())
      .collect()
  }
}

impl Engine for ScriptedEngine {
  async fn choose_and_invoke(
    &self,
    prompt: &str,
    purpose: Purpose,
    model_hint: Option<&str>,
  ) -> Option<Completion> {
    self
      .prompts
      .lock()
      .unwrap()
      .push((purpose, prompt.to_owned()));

    let queued = self
      .queued
      .lock()
      .unwrap()
      .get_mut(&purpose.to_string())
      .and_then(VecDeque::pop_front);
    let text = match queued {
      Some(answer) => answer,
      None => self.responder.as_ref().and_then(|f| f(purpose, prompt)),
    }?;

    Some(Completion {
      text,
      backend: "scripted".into(),
      model: model_hint.unwrap_or("scripted-model").to_owned(),
    })
  }
}

// ─── Collaborators ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeFeeds {
  feeds: HashMap<String, Result<FetchedFeed, String>>,
}

impl FakeFeeds {
  pub fn with(mut self, url: &str, entries: Vec<FeedEntry>) -> Self {
    self
      .feeds
      .insert(url.into(), Ok(FetchedFeed { title: Some("Fake Feed".into()), entries }));
    self
  }

  pub fn failing(mut self, url: &str) -> Self {
    self.feeds.insert(url.into(), Err("connection refused".into()));
    self
  }
}

impl FeedSource for FakeFeeds {
  async fn fetch(&self, feed_url: &str) -> Result<FetchedFeed, CollaboratorError> {
    match self.feeds.get(feed_url) {
      Some(Ok(feed)) => Ok(feed.clone()),
      Some(Err(e)) => Err(CollaboratorError::Rejected(e.clone())),
      None => Err(CollaboratorError::Rejected(format!("unknown feed {feed_url}"))),
    }
  }
}

pub fn entry(link: &str, title: &str) -> FeedEntry {
  FeedEntry {
    title:     title.into(),
    link:      link.into(),
    published: Some(Utc::now() - Duration::minutes(30)),
    image_url: None,
  }
}

/// Serves fixed page text per URL; unknown URLs fail.
#[derive(Default)]
pub struct FakeExtractor {
  pages: HashMap<String, String>,
  /// URLs that never answer.
  hang:  Vec<String>,
}

impl FakeExtractor {
  pub fn page(mut self, url: &str, text: impl Into<String>) -> Self {
    self.pages.insert(url.into(), text.into());
    self
  }

  pub fn hanging(mut self, url: &str) -> Self {
    self.hang.push(url.into());
    self
  }
}

impl ContentExtractor for FakeExtractor {
  async fn extract(&self, url: &str) -> Result<ExtractedPage, CollaboratorError> {
    if self.hang.iter().any(|u| u == url) {
      std::future::pending::<()>().await;
    }
    self
      .pages
      .get(url)
      .map(|text| ExtractedPage { text: text.clone(), title: None })
      .ok_or_else(|| CollaboratorError::Rejected(format!("HTTP 404 for {url}")))
  }
}

#[derive(Default)]
pub struct RecordingNotifier {
  pub sent: Mutex<Vec<String>>,
  pub fail: bool,
}

impl Notifier for RecordingNotifier {
  async fn notify(&self, message: &str) -> Result<(), CollaboratorError> {
    self.sent.lock().unwrap().push(message.to_owned());
    if self.fail {
      return Err(CollaboratorError::Rejected("chat not found".into()));
    }
    Ok(())
  }
}
