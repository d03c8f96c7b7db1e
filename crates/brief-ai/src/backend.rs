//! The `AiBackend` trait — one request/response exchange with a model.

use std::future::Future;

/// A single AI backend.
///
/// `invoke` never fails loudly: spawn errors, non-zero exits, timeouts and
/// malformed envelopes are logged by the implementation and reported as
/// `None`.
pub trait AiBackend: Send + Sync {
  /// Short name used in logs and in [`Completion::backend`](crate::Completion).
  fn name(&self) -> &str;

  /// Model used when a request carries no usable hint.
  fn default_model(&self) -> &str;

  /// Whether `model` belongs to this backend's model family.
  fn owns_model(&self, model: &str) -> bool;

  fn invoke<'a>(
    &'a self,
    prompt: &'a str,
    model: &'a str,
  ) -> impl Future<Output = Option<String>> + Send + 'a;
}
