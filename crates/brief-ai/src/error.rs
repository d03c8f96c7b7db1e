//! Error types for `brief-ai`.
//!
//! These never leave the crate's public async APIs; they exist so the
//! diagnostics logged before normalising to "no result" are precise.

use std::time::Duration;

use thiserror::Error;

/// Why a backend response envelope could not be unpacked.
#[derive(Debug, Error)]
pub enum EnvelopeError {
  #[error("no JSON object in output")]
  NoJsonObject,

  #[error("malformed JSON envelope: {0}")]
  Json(#[from] serde_json::Error),

  #[error("envelope has no string `response` field")]
  MissingResponse,

  #[error("empty answer")]
  Empty,
}

/// Why one exchange with an AI executable failed.
#[derive(Debug, Error)]
pub enum InvokeError {
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source:  std::io::Error,
  },

  #[error("i/o error talking to the process: {0}")]
  Io(#[from] std::io::Error),

  #[error("timed out after {0:?}")]
  Timeout(Duration),

  #[error("exited with {code:?}: {stderr}")]
  ExitStatus {
    code:   Option<i32>,
    stderr: String,
  },

  #[error(transparent)]
  Envelope(#[from] EnvelopeError),
}
