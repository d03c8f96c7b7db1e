//! [`EngineRouter`] — backend selection, rotation and fallback.
//!
//! | Policy      | Behaviour |
//! |-------------|-----------|
//! | `primary`   | always backend A |
//! | `secondary` | always backend B |
//! | `hybrid`    | even draw → A, odd draw → B; an A call with no result is retried once on B |

use std::{
  future::Future,
  sync::{Arc, Mutex, PoisonError},
};

use serde::Deserialize;
use strum::Display;
use tracing::{debug, info, warn};

use crate::AiBackend;

// ─── Request/response types ──────────────────────────────────────────────────

/// Which backend(s) requests are routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnginePolicy {
  #[default]
  #[serde(alias = "gemini")]
  Primary,
  #[serde(alias = "codex")]
  Secondary,
  Hybrid,
}

/// What a request is for; carried into logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Purpose {
  Filter,
  Analysis,
  Insight,
}

/// A successful answer and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
  pub text:    String,
  pub backend: String,
  pub model:   String,
}

// ─── Engine trait ────────────────────────────────────────────────────────────

/// The interface pipeline stages use to reach a model.
pub trait Engine: Send + Sync {
  /// Pick a backend, resolve the model and run one exchange. `None` means no
  /// usable answer; the caller decides whether to retry or skip.
  fn choose_and_invoke<'a>(
    &'a self,
    prompt: &'a str,
    purpose: Purpose,
    model_hint: Option<&'a str>,
  ) -> impl Future<Output = Option<Completion>> + Send + 'a;
}

// ─── Rotation counter ────────────────────────────────────────────────────────

/// Draw counter for the hybrid policy.
///
/// Owned by the router (and injectable so several routers can share one
/// rotation); the read-increment happens under a mutex.
#[derive(Debug, Default)]
pub struct RotationCounter {
  next: Mutex<u64>,
}

impl RotationCounter {
  pub fn new() -> Self { Self::default() }

  /// Return the current draw and advance the counter.
  pub fn draw(&self) -> u64 {
    let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
    let drawn = *next;
    *next = next.wrapping_add(1);
    drawn
  }

  /// Number of draws taken so far.
  pub fn draws(&self) -> u64 {
    *self.next.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Routes requests between a primary backend `A` and a secondary backend `B`.
#[derive(Debug)]
pub struct EngineRouter<A, B> {
  policy:    EnginePolicy,
  primary:   A,
  secondary: B,
  counter:   Arc<RotationCounter>,
}

impl<A: AiBackend, B: AiBackend> EngineRouter<A, B> {
  pub fn new(policy: EnginePolicy, primary: A, secondary: B) -> Self {
    Self::with_counter(policy, primary, secondary, Arc::new(RotationCounter::new()))
  }

  pub fn with_counter(
    policy: EnginePolicy,
    primary: A,
    secondary: B,
    counter: Arc<RotationCounter>,
  ) -> Self {
    Self { policy, primary, secondary, counter }
  }

  pub fn policy(&self) -> EnginePolicy { self.policy }

  pub fn counter(&self) -> &Arc<RotationCounter> { &self.counter }
}

/// The model to send to `target`: the hint, unless it is absent or belongs to
/// `other`'s family, in which case `target`'s default.
fn resolve_model<'a>(
  target: &'a impl AiBackend,
  other: &impl AiBackend,
  hint: Option<&'a str>,
) -> &'a str {
  match hint {
    Some(model) if !other.owns_model(model) => model,
    _ => target.default_model(),
  }
}

async fn call(
  target: &impl AiBackend,
  other: &impl AiBackend,
  prompt: &str,
  purpose: Purpose,
  hint: Option<&str>,
) -> Option<Completion> {
  let model = resolve_model(target, other, hint);
  debug!(%purpose, backend = target.name(), model, "dispatching request");

  let text = target.invoke(prompt, model).await?;
  Some(Completion {
    text,
    backend: target.name().to_owned(),
    model: model.to_owned(),
  })
}

impl<A: AiBackend, B: AiBackend> Engine for EngineRouter<A, B> {
  async fn choose_and_invoke(
    &self,
    prompt: &str,
    purpose: Purpose,
    model_hint: Option<&str>,
  ) -> Option<Completion> {
    let (a, b) = (&self.primary, &self.secondary);

    let completion = match self.policy {
      EnginePolicy::Primary => call(a, b, prompt, purpose, model_hint).await,
      EnginePolicy::Secondary => call(b, a, prompt, purpose, model_hint).await,
      EnginePolicy::Hybrid => {
        if self.counter.draw() % 2 == 0 {
          match call(a, b, prompt, purpose, model_hint).await {
            Some(completion) => Some(completion),
            None => {
              info!(%purpose, from = a.name(), to = b.name(), "falling back to secondary backend");
              call(b, a, prompt, purpose, model_hint).await
            }
          }
        } else {
          call(b, a, prompt, purpose, model_hint).await
        }
      }
    };

    if completion.is_none() {
      warn!(%purpose, policy = ?self.policy, "no AI result");
    }
    completion
  }
}
