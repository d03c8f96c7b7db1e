//! Insight synthesis: one aggregate report per UTC date from this run's
//! analyses.

use std::fmt::Write as _;

use brief_ai::{Engine, Purpose};
use brief_core::{insight::DailyInsight, store::ArticleStore};
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::{
  analyze::AnalyzedArticle,
  config::PipelineConfig,
  error::{Error, Result},
  payload::InsightPayload,
};

fn insight_prompt(date: NaiveDate, analyzed: &[AnalyzedArticle]) -> String {
  let mut listing = String::new();
  for (i, a) in analyzed.iter().enumerate() {
    let _ = writeln!(
      listing,
      "[{}] {} (Sentiment: {})\n   Summary: {}\n   Impact: {}\n",
      i + 1,
      a.title,
      a.analysis.tags.sentiment,
      a.analysis.summary,
      a.analysis.impact_analysis.as_deref().unwrap_or("n/a"),
    );
  }

  format!(
    "Based on the following {count} financial news articles, write today's \
     strategic market briefing.\n\n\
     Articles:\n{listing}\n\
     Answer with exactly this JSON shape and no markdown:\n\
     {{\n  \
       \"date\": \"{date}\",\n  \
       \"main_trends\": [\"Main trend 1\", \"Main trend 2\"],\n  \
       \"hidden_insights\": [\"A non-obvious insight you noticed in the data\"],\n  \
       \"media_steering_analysis\": \"Which way the media is steering opinion (FUD, FOMO or caution)\",\n  \
       \"hot_topics\": [\"Topic 1\", \"Topic 2\"],\n  \
       \"market_sentiment_overlay\": \"Overall market mood (Bullish / Bearish / Neutral) and why\"\n\
     }}\n",
    count = analyzed.len(),
  )
}

/// Synthesise and store the insight for `date`.
///
/// Returns `None` when there is nothing to synthesise or the model gives no
/// usable answer; persisted analyses are untouched either way.
pub async fn synthesize<S, E>(
  store: &S,
  engine: &E,
  analyzed: &[AnalyzedArticle],
  config: &PipelineConfig,
  date: NaiveDate,
) -> Result<Option<DailyInsight>>
where
  S: ArticleStore,
  E: Engine,
{
  if analyzed.is_empty() {
    info!("no analyses this run; skipping insight synthesis");
    return Ok(None);
  }

  let prompt = insight_prompt(date, analyzed);
  let Some(completion) = engine
    .choose_and_invoke(&prompt, Purpose::Insight, config.insight_model())
    .await
  else {
    warn!(%date, "no answer for insight synthesis");
    return Ok(None);
  };

  let insight = match InsightPayload::parse(&completion.text)
    .and_then(|payload| payload.into_insight(date, Utc::now()))
  {
    Ok(insight) => insight,
    Err(error) => {
      warn!(%date, backend = %completion.backend, %error, "rejected insight");
      return Ok(None);
    }
  };

  store
    .upsert_daily_insight(&insight)
    .await
    .map_err(Error::store)?;
  info!(%date, articles = analyzed.len(), "daily insight stored");
  Ok(Some(insight))
}

#[cfg(test)]
mod tests {
  use brief_core::{
    article::{AnalysisResult, ArticleTags, Sentiment},
    store::ArticleStore,
  };

  use super::*;
  use crate::testing::{ScriptedEngine, store};

  fn analyzed(title: &str) -> AnalyzedArticle {
    AnalyzedArticle {
      url:      format!("https://e/{title}"),
      title:    title.into(),
      analysis: AnalysisResult {
        summary:          format!("{title} summary"),
        tags:             ArticleTags { sentiment: Sentiment::Negative, ..Default::default() },
        author_intent:    None,
        impact_analysis:  Some("Down".into()),
        language:         "vi".into(),
        importance_score: 8,
        origin:           "VN".into(),
        model_version:    "m".into(),
        analyzed_at:      Utc::now(),
      },
    }
  }

  fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2026, 3, 2).unwrap() }

  #[test]
  fn prompt_lists_every_article() {
    let prompt = insight_prompt(date(), &[analyzed("Gold"), analyzed("Oil")]);
    assert!(prompt.contains("following 2 financial"));
    assert!(prompt.contains("[1] Gold (Sentiment: negative)"));
    assert!(prompt.contains("[2] Oil"));
    assert!(prompt.contains("Impact: Down"));
    assert!(prompt.contains("\"date\": \"2026-03-02\""));
  }

  #[tokio::test]
  async fn same_date_is_replaced() {
    let s = store().await;
    let engine = ScriptedEngine::new()
      .queue(
        Purpose::Insight,
        Some(r#"{"main_trends": ["first"], "hot_topics": ["a", "b"], "hidden_insights": ["h"]}"#),
      )
      .queue(Purpose::Insight, Some(r#"{"main_trends": ["second"]}"#));
    let config = PipelineConfig::default();
    let batch = [analyzed("Gold")];

    synthesize(&s, &engine, &batch, &config, date())
      .await
      .unwrap()
      .unwrap();
    let second = synthesize(&s, &engine, &batch, &config, date())
      .await
      .unwrap()
      .unwrap();

    let stored = s.get_daily_insight(date()).await.unwrap().unwrap();
    assert_eq!(stored.main_trends, second.main_trends);
    assert_eq!(stored.main_trends, vec!["second"]);
    assert!(stored.hot_topics.is_empty());
    assert!(stored.hidden_insights.is_empty());
    assert_eq!(s.list_daily_insights(10).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn failures_store_nothing() {
    let s = store().await;
    let engine = ScriptedEngine::new()
      .queue(Purpose::Insight, None)
      .queue(Purpose::Insight, Some(r#"{"hidden_insights": ["only"]}"#));
    let batch = [analyzed("Gold")];
    let config = PipelineConfig::default();

    assert!(synthesize(&s, &engine, &batch, &config, date()).await.unwrap().is_none());
    assert!(synthesize(&s, &engine, &batch, &config, date()).await.unwrap().is_none());
    assert!(synthesize(&s, &engine, &[], &config, date()).await.unwrap().is_none());
    assert!(s.get_daily_insight(date()).await.unwrap().is_none());
    assert_eq!(engine.prompts(Purpose::Insight).len(), 2);
  }
}
