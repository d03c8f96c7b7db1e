//! Integration tests for `SqliteStore` against an in-memory database.

use brief_core::{
  article::{AnalysisResult, ArticleStatus, ArticleTags, NewArticle, Sentiment},
  insight::DailyInsight,
  store::{ArticleQuery, ArticleStore, RepairReport},
};
use chrono::{Duration, NaiveDate, Utc};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_article(url: &str, title: &str) -> NewArticle {
  NewArticle {
    url:          url.into(),
    title:        title.into(),
    source:       "vnexpress.net".into(),
    published_at: Some(Utc::now() - Duration::hours(1)),
    image_url:    None,
  }
}

fn analysis(summary: &str) -> AnalysisResult {
  AnalysisResult {
    summary:          summary.into(),
    tags:             ArticleTags {
      source:    Some("VnExpress".into()),
      sectors:   vec!["Banking".into()],
      entities:  vec!["Techcombank".into()],
      people:    vec![],
      locations: vec!["Hanoi".into()],
      keywords:  vec!["interest rates".into()],
      sentiment: Sentiment::Positive,
    },
    author_intent:    Some("News".into()),
    impact_analysis:  Some("Stable".into()),
    language:         "vi".into(),
    importance_score: 8,
    origin:           "VN".into(),
    model_version:    "gemini-3-pro-preview".into(),
    analyzed_at:      Utc::now(),
  }
}

/// Seed one article and walk it to `status` through the stage writes.
async fn seed_at(s: &SqliteStore, url: &str, status: ArticleStatus) {
  s.upsert_fetched(new_article(url, "Seeded")).await.unwrap();
  if status == ArticleStatus::Fetched {
    return;
  }
  if status == ArticleStatus::FilteredOut {
    s.update_filter_result(url, status, 2, "PR").await.unwrap();
    return;
  }
  s.update_filter_result(url, ArticleStatus::FilteredIn, 8, "rates")
    .await
    .unwrap();
  if status == ArticleStatus::FilteredIn {
    return;
  }
  s.update_scrape_result(url, &"body ".repeat(40)).await.unwrap();
  if status == ArticleStatus::Scraped {
    return;
  }
  s.update_analysis_result(url, &analysis("Summary")).await.unwrap();
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_reports_creation_once() {
  let s = store().await;

  assert!(s.upsert_fetched(new_article("https://a/1", "First")).await.unwrap());
  assert!(!s.upsert_fetched(new_article("https://a/1", "First")).await.unwrap());

  let all = s.list_articles(&ArticleQuery::default()).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].status, ArticleStatus::Fetched);
}

#[tokio::test]
async fn upsert_refreshes_title_and_keeps_non_null_fields() {
  let s = store().await;
  let published = Utc::now() - Duration::hours(3);

  let mut first = new_article("https://a/1", "Old title");
  first.published_at = Some(published);
  first.image_url = Some("https://img/1.jpg".into());
  s.upsert_fetched(first).await.unwrap();

  let mut second = new_article("https://a/1", "New title");
  second.published_at = None;
  second.image_url = None;
  s.upsert_fetched(second).await.unwrap();

  let a = s.get_article("https://a/1").await.unwrap().unwrap();
  assert_eq!(a.title, "New title");
  assert_eq!(a.image_url.as_deref(), Some("https://img/1.jpg"));
  assert_eq!(
    a.published_date.map(|d| d.timestamp_micros()),
    Some(published.timestamp_micros())
  );
}

#[tokio::test]
async fn upsert_fills_previously_null_fields() {
  let s = store().await;

  let mut first = new_article("https://a/1", "Title");
  first.image_url = None;
  s.upsert_fetched(first).await.unwrap();

  let mut second = new_article("https://a/1", "Title");
  second.image_url = Some("https://img/late.jpg".into());
  s.upsert_fetched(second).await.unwrap();

  let a = s.get_article("https://a/1").await.unwrap().unwrap();
  assert_eq!(a.image_url.as_deref(), Some("https://img/late.jpg"));
}

#[tokio::test]
async fn upsert_does_not_reset_status() {
  let s = store().await;
  seed_at(&s, "https://a/1", ArticleStatus::Scraped).await;

  s.upsert_fetched(new_article("https://a/1", "Seen again"))
    .await
    .unwrap();

  let a = s.get_article("https://a/1").await.unwrap().unwrap();
  assert_eq!(a.status, ArticleStatus::Scraped);
  assert!(a.content.is_some());
}

// ─── Selection ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn select_by_status_respects_window() {
  let s = store().await;

  s.upsert_fetched(new_article("https://a/recent", "Recent"))
    .await
    .unwrap();

  let mut old = new_article("https://a/old", "Old");
  old.published_at = Some(Utc::now() - Duration::hours(48));
  s.upsert_fetched(old).await.unwrap();

  let mut undated = new_article("https://a/undated", "Undated");
  undated.published_at = None;
  s.upsert_fetched(undated).await.unwrap();

  let windowed = s
    .select_by_status(ArticleStatus::Fetched, Some(Duration::hours(24)))
    .await
    .unwrap();
  let urls: Vec<_> = windowed.iter().map(|a| a.url.as_str()).collect();
  assert_eq!(urls.len(), 2);
  assert!(urls.contains(&"https://a/recent"));
  assert!(urls.contains(&"https://a/undated"));

  let all = s.select_by_status(ArticleStatus::Fetched, None).await.unwrap();
  assert_eq!(all.len(), 3);

  let count = s
    .count_by_status(ArticleStatus::Fetched, Some(Duration::hours(24)))
    .await
    .unwrap();
  assert_eq!(count, 2);
}

#[tokio::test]
async fn status_counts_and_listing() {
  let s = store().await;
  seed_at(&s, "https://a/1", ArticleStatus::Fetched).await;
  seed_at(&s, "https://a/2", ArticleStatus::FilteredOut).await;
  seed_at(&s, "https://a/3", ArticleStatus::FilteredOut).await;
  seed_at(&s, "https://a/4", ArticleStatus::Analyzed).await;

  let counts = s.status_counts().await.unwrap();
  assert_eq!(counts.get(&ArticleStatus::Fetched), Some(&1));
  assert_eq!(counts.get(&ArticleStatus::FilteredOut), Some(&2));
  assert_eq!(counts.get(&ArticleStatus::Analyzed), Some(&1));
  assert_eq!(counts.get(&ArticleStatus::Scraped), None);

  let out = s
    .list_articles(&ArticleQuery {
      status: Some(ArticleStatus::FilteredOut),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(out.len(), 2);

  let page = s
    .list_articles(&ArticleQuery { limit: Some(1), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);
}

// ─── Stage transitions ───────────────────────────────────────────────────────

#[tokio::test]
async fn filter_result_applies_once() {
  let s = store().await;
  seed_at(&s, "https://a/1", ArticleStatus::Fetched).await;

  let applied = s
    .update_filter_result("https://a/1", ArticleStatus::FilteredIn, 9, "FX impact")
    .await
    .unwrap();
  assert!(applied);

  let a = s.get_article("https://a/1").await.unwrap().unwrap();
  assert_eq!(a.status, ArticleStatus::FilteredIn);
  assert_eq!(a.filter_score, Some(9));
  assert_eq!(a.filter_reason.as_deref(), Some("FX impact"));

  // A replayed verdict must not move the row again.
  let replay = s
    .update_filter_result("https://a/1", ArticleStatus::FilteredOut, 1, "late")
    .await
    .unwrap();
  assert!(!replay);
  let a = s.get_article("https://a/1").await.unwrap().unwrap();
  assert_eq!(a.status, ArticleStatus::FilteredIn);
  assert_eq!(a.filter_score, Some(9));
}

#[tokio::test]
async fn filter_result_rejects_foreign_status() {
  let s = store().await;
  seed_at(&s, "https://a/1", ArticleStatus::Fetched).await;

  let err = s
    .update_filter_result("https://a/1", ArticleStatus::Scraped, 9, "")
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(brief_core::Error::InvalidTransition { .. })
  ));
}

#[tokio::test]
async fn scrape_requires_filtered_in() {
  let s = store().await;
  seed_at(&s, "https://a/1", ArticleStatus::Fetched).await;

  assert!(!s.update_scrape_result("https://a/1", "text").await.unwrap());
  let a = s.get_article("https://a/1").await.unwrap().unwrap();
  assert_eq!(a.status, ArticleStatus::Fetched);
  assert!(a.content.is_none());

  s.update_filter_result("https://a/1", ArticleStatus::FilteredIn, 8, "")
    .await
    .unwrap();
  assert!(s.update_scrape_result("https://a/1", "text").await.unwrap());

  let a = s.get_article("https://a/1").await.unwrap().unwrap();
  assert_eq!(a.status, ArticleStatus::Scraped);
  assert_eq!(a.content.as_deref(), Some("text"));
  assert!(a.scraped_at.is_some());
}

#[tokio::test]
async fn analysis_round_trip() {
  let s = store().await;
  seed_at(&s, "https://a/1", ArticleStatus::Scraped).await;

  let input = analysis("Rates were cut by 50bp.");
  assert!(s.update_analysis_result("https://a/1", &input).await.unwrap());

  let a = s.get_article("https://a/1").await.unwrap().unwrap();
  assert_eq!(a.status, ArticleStatus::Analyzed);
  assert_eq!(a.summary.as_deref(), Some("Rates were cut by 50bp."));
  assert_eq!(a.tags, Some(input.tags.clone()));
  assert_eq!(a.importance_score, Some(8));
  assert_eq!(a.model_version.as_deref(), Some("gemini-3-pro-preview"));
  assert_eq!(a.language.as_deref(), Some("vi"));
  assert_eq!(a.origin.as_deref(), Some("VN"));

  // Already analyzed: a duplicate write is a no-op.
  assert!(!s.update_analysis_result("https://a/1", &input).await.unwrap());
}

#[tokio::test]
async fn missing_article_updates_are_noops() {
  let s = store().await;
  assert!(s.get_article("https://nowhere").await.unwrap().is_none());
  assert!(
    !s.update_filter_result("https://nowhere", ArticleStatus::FilteredIn, 9, "")
      .await
      .unwrap()
  );
}

// ─── Repair ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn repair_resets_missing_content_and_tags() {
  let s = store().await;
  seed_at(&s, "https://a/ok", ArticleStatus::Analyzed).await;
  seed_at(&s, "https://a/placeholder", ArticleStatus::Analyzed).await;
  seed_at(&s, "https://a/empty", ArticleStatus::Scraped).await;
  seed_at(&s, "https://a/untagged", ArticleStatus::Analyzed).await;
  seed_at(&s, "https://a/legacy", ArticleStatus::Analyzed).await;

  s.execute_raw(
    "UPDATE articles SET content = 'From JSON Migration' WHERE url = 'https://a/placeholder';
     UPDATE articles SET content = '' WHERE url = 'https://a/empty';
     UPDATE articles SET tags = NULL WHERE url = 'https://a/untagged';
     UPDATE articles SET tags = '{}' WHERE url = 'https://a/legacy';",
  )
  .await
  .unwrap();

  let report = s.repair().await.unwrap();
  assert_eq!(report, RepairReport { content_reset: 2, tags_reset: 2 });

  let status = |url: &'static str| {
    let s = s.clone();
    async move { s.get_article(url).await.unwrap().unwrap().status }
  };
  assert_eq!(status("https://a/ok").await, ArticleStatus::Analyzed);
  assert_eq!(status("https://a/placeholder").await, ArticleStatus::FilteredIn);
  assert_eq!(status("https://a/empty").await, ArticleStatus::FilteredIn);
  assert_eq!(status("https://a/untagged").await, ArticleStatus::Scraped);
  assert_eq!(status("https://a/legacy").await, ArticleStatus::Scraped);

  // Idempotent on unchanged data.
  assert_eq!(s.repair().await.unwrap(), RepairReport::default());
}

// ─── Daily insights ──────────────────────────────────────────────────────────

fn insight(date: NaiveDate, trend: &str) -> DailyInsight {
  DailyInsight {
    date,
    main_trends:              vec![trend.into()],
    hidden_insights:          vec!["Liquidity is tightening".into()],
    hot_topics:               vec!["FED".into()],
    media_steering_analysis:  Some("Cautious".into()),
    market_sentiment_overlay: Some("Neutral".into()),
    created_at:               Utc::now(),
  }
}

#[tokio::test]
async fn insight_upsert_replaces_same_date() {
  let s = store().await;
  let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

  s.upsert_daily_insight(&insight(date, "first run")).await.unwrap();

  let mut second = insight(date, "second run");
  second.media_steering_analysis = None;
  second.hidden_insights = vec![];
  s.upsert_daily_insight(&second).await.unwrap();

  let all = s.list_daily_insights(10).await.unwrap();
  assert_eq!(all.len(), 1);

  let stored = s.get_daily_insight(date).await.unwrap().unwrap();
  assert_eq!(stored.main_trends, vec!["second run"]);
  assert!(stored.hidden_insights.is_empty());
  assert!(stored.media_steering_analysis.is_none());
}

#[tokio::test]
async fn insights_list_newest_first() {
  let s = store().await;
  let d1 = NaiveDate::from_ymd_opt(2025, 3, 13).unwrap();
  let d2 = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

  s.upsert_daily_insight(&insight(d1, "a")).await.unwrap();
  s.upsert_daily_insight(&insight(d2, "b")).await.unwrap();

  let all = s.list_daily_insights(10).await.unwrap();
  assert_eq!(all.iter().map(|i| i.date).collect::<Vec<_>>(), vec![d2, d1]);

  let missing = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
  assert!(s.get_daily_insight(missing).await.unwrap().is_none());
}
