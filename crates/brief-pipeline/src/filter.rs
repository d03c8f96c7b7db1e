//! Filtering: score `fetched` articles in batches and split them into
//! `filtered_in` / `filtered_out`.

use std::collections::HashMap;

use brief_ai::{Engine, Purpose};
use brief_core::{
  article::{Article, ArticleStatus},
  store::ArticleStore,
};
use tracing::{debug, info, warn};

use crate::{
  config::PipelineConfig,
  error::{Error, Result},
  payload::parse_verdicts,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
  pub candidates:      usize,
  /// URLs moved to `filtered_in` by this run.
  pub selected:        Vec<String>,
  pub rejected:        usize,
  /// Batches with no usable answer; their articles stay `fetched`.
  pub skipped_batches: usize,
}

fn filter_prompt(threshold: i32, batch: &[(u64, &Article)]) -> String {
  let listing = batch
    .iter()
    .map(|(id, article)| format!("ID: {id} | Title: {}", article.title))
    .collect::<Vec<_>>()
    .join("\n");

  format!(
    "You are a financial analyst. Rate how important each of the following news \
     items is for markets, on a scale from 0 to 10.\n\
     Only items scoring {threshold} or more will be kept.\n\n\
     Answer with a single JSON array and nothing else. Each element must contain:\n\
     - id: the item ID (integer)\n\
     - score: importance from 0 to 10\n\
     - reason: one short sentence\n\n\
     Example: [{{\"id\": 0, \"score\": 8, \"reason\": \"Moves the exchange rate\"}}, \
     {{\"id\": 1, \"score\": 2, \"reason\": \"Press release\"}}]\n\n\
     News items:\n{listing}\n"
  )
}

/// Score every `fetched` article inside the recency window.
///
/// Each verdict is written as soon as it is read; a batch without a usable
/// answer is skipped and its articles stay `fetched` for the next run.
pub async fn filter<S, E>(store: &S, engine: &E, config: &PipelineConfig) -> Result<FilterOutcome>
where
  S: ArticleStore,
  E: Engine,
{
  let mut candidates = store
    .select_by_status(ArticleStatus::Fetched, config.recency_window())
    .await
    .map_err(Error::store)?;
  config
    .sampling
    .apply(&mut candidates, config.sampling.limit.saturating_mul(2));

  let mut outcome = FilterOutcome { candidates: candidates.len(), ..Default::default() };
  if candidates.is_empty() {
    info!("no fetched articles to filter");
    return Ok(outcome);
  }

  let ids: Vec<(u64, &Article)> = candidates
    .iter()
    .enumerate()
    .map(|(i, a)| (i as u64, a))
    .collect();
  let batch_size = config.filter_batch_size.max(1);
  let batches = ids.len().div_ceil(batch_size);
  info!(candidates = ids.len(), batches, threshold = config.importance_threshold, "filtering");

  for (n, batch) in ids.chunks(batch_size).enumerate() {
    let id_map: HashMap<u64, &Article> = batch.iter().copied().collect();
    let prompt = filter_prompt(config.importance_threshold, batch);

    let Some(completion) = engine
      .choose_and_invoke(&prompt, Purpose::Filter, config.filter_model.as_deref())
      .await
    else {
      warn!(batch = n + 1, of = batches, "no answer for filter batch; skipping");
      outcome.skipped_batches += 1;
      continue;
    };

    let verdicts = match parse_verdicts(&completion.text) {
      Ok(verdicts) => verdicts,
      Err(error) => {
        warn!(batch = n + 1, of = batches, %error, "unusable filter answer; skipping batch");
        outcome.skipped_batches += 1;
        continue;
      }
    };

    for verdict in verdicts {
      let Some(article) = id_map.get(&verdict.id) else {
        debug!(id = verdict.id, "ignoring verdict for unknown id");
        continue;
      };

      let status = if verdict.meets(config.importance_threshold) {
        ArticleStatus::FilteredIn
      } else {
        ArticleStatus::FilteredOut
      };
      let reason = verdict.reason.as_deref().unwrap_or_default();

      let applied = store
        .update_filter_result(&article.url, status, verdict.rounded_score(), reason)
        .await
        .map_err(Error::store)?;
      if !applied {
        debug!(url = %article.url, "article already filtered; verdict ignored");
        continue;
      }

      match status {
        ArticleStatus::FilteredIn => {
          info!(url = %article.url, score = verdict.score, title = %article.title, "kept");
          outcome.selected.push(article.url.clone());
        }
        _ => outcome.rejected += 1,
      }
    }
  }

  info!(
    selected = outcome.selected.len(),
    rejected = outcome.rejected,
    skipped_batches = outcome.skipped_batches,
    "filtering finished"
  );
  Ok(outcome)
}
