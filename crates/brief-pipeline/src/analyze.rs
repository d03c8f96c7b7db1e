//! Analysis: ask the model for a structured read of every `scraped` article.
//!
//! Requests run concurrently; each result is persisted from this task as soon
//! as its request completes, so a late failure only costs the articles still
//! in flight.

use brief_ai::{Engine, Purpose, util::truncate_to_char_boundary};
use brief_core::{
  article::{AnalysisResult, Article, ArticleStatus},
  store::ArticleStore,
};
use chrono::Utc;
use futures::{StreamExt as _, stream};
use tracing::{info, warn};

use crate::{
  config::PipelineConfig,
  error::{Error, Result},
  payload::AnalysisPayload,
};

/// An analysis persisted during this run.
#[derive(Debug, Clone)]
pub struct AnalyzedArticle {
  pub url:      String,
  pub title:    String,
  pub analysis: AnalysisResult,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisOutcome {
  pub attempted: usize,
  pub analyzed:  Vec<AnalyzedArticle>,
  /// Articles left at `scraped`.
  pub failed:    usize,
}

fn analysis_prompt(title: &str, content: &str) -> String {
  format!(
    "Analyse the following financial news article and extract its key \
     information as JSON.\n\n\
     Title: {title}\n\
     Content: {content}\n\n\
     Answer with exactly this JSON shape and no markdown:\n\
     {{\n  \
       \"summary\": \"Three sentences, focused on figures and events\",\n  \
       \"language\": \"vi or en\",\n  \
       \"importance_score\": 1-10,\n  \
       \"origin\": \"VN or Global\",\n  \
       \"tags\": {{\n    \
         \"source\": \"Publisher\",\n    \
         \"sectors\": [\"Real estate\", \"Banking\"],\n    \
         \"entities\": [\"Vingroup\", \"Techcombank\"],\n    \
         \"people\": [\"...\"],\n    \
         \"locations\": [\"Ho Chi Minh City\", \"Hanoi\"],\n    \
         \"keywords\": [\"FED\", \"Interest rates\"],\n    \
         \"sentiment\": \"positive | negative | neutral\"\n  \
       }},\n  \
       \"author_intent\": \"Purpose of the article (PR, news, warning, ...)\",\n  \
       \"impact_analysis\": \"Expected short-term impact (up / down / stable) on the related market\"\n\
     }}\n"
  )
}

async fn analyze_one<E: Engine>(
  engine: &E,
  article: &Article,
  config: &PipelineConfig,
) -> Option<AnalysisResult> {
  let content = article.content.as_deref().unwrap_or_default();
  if content.trim().is_empty() {
    warn!(url = %article.url, "scraped article has no content; run repair");
    return None;
  }

  let prompt = analysis_prompt(
    &article.title,
    truncate_to_char_boundary(content, config.max_chars_per_article),
  );
  let completion = engine
    .choose_and_invoke(&prompt, Purpose::Analysis, config.analysis_model.as_deref())
    .await?;

  match AnalysisPayload::parse(&completion.text)
    .and_then(|payload| payload.into_result(completion.model, Utc::now()))
  {
    Ok(analysis) => Some(analysis),
    Err(error) => {
      warn!(url = %article.url, backend = %completion.backend, %error, "rejected analysis");
      None
    }
  }
}

/// Analyse every `scraped` article inside the recency window.
pub async fn analyze<S, E>(
  store: &S,
  engine: &E,
  config: &PipelineConfig,
) -> Result<AnalysisOutcome>
where
  S: ArticleStore,
  E: Engine,
{
  let articles = store
    .select_by_status(ArticleStatus::Scraped, config.recency_window())
    .await
    .map_err(Error::store)?;

  let mut outcome = AnalysisOutcome { attempted: articles.len(), ..Default::default() };
  if articles.is_empty() {
    info!("no scraped articles to analyse");
    return Ok(outcome);
  }
  info!(articles = articles.len(), workers = config.analysis_workers, "analysing");

  let mut results = stream::iter(articles.iter().map(|article| async move {
    (article, analyze_one(engine, article, config).await)
  }))
  .buffer_unordered(config.analysis_workers.max(1));

  while let Some((article, result)) = results.next().await {
    let Some(analysis) = result else {
      outcome.failed += 1;
      continue;
    };

    let applied = store
      .update_analysis_result(&article.url, &analysis)
      .await
      .map_err(Error::store)?;
    if !applied {
      warn!(url = %article.url, "article left scraped meanwhile; analysis dropped");
      outcome.failed += 1;
      continue;
    }

    info!(
      url = %article.url,
      importance = analysis.importance_score,
      model = %analysis.model_version,
      "analysed"
    );
    outcome.analyzed.push(AnalyzedArticle {
      url: article.url.clone(),
      title: article.title.clone(),
      analysis,
    });
  }

  info!(analyzed = outcome.analyzed.len(), failed = outcome.failed, "analysis finished");
  Ok(outcome)
}
