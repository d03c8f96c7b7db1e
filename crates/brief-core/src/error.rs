//! Error types for `brief-core`.

use thiserror::Error;

use crate::article::ArticleStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown article status: {0:?}")]
  UnknownStatus(String),

  /// A stage tried to write a status it does not own.
  #[error("status {to} cannot be written by the {from} stage")]
  InvalidTransition {
    from: ArticleStatus,
    to:   ArticleStatus,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
