//! Read-only JSON API for the Brief dashboard.
//!
//! Exposes an axum [`Router`] backed by any [`brief_core::store::ArticleStore`].
//! Nothing here writes: articles only move through the pipeline.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", brief_api::api_router(store.clone()))
//! ```

pub mod articles;
pub mod error;
pub mod insights;

use std::sync::Arc;

use axum::{Router, routing::get};
use brief_core::store::ArticleStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ArticleStore + 'static,
{
  Router::new()
    // Articles
    .route("/articles", get(articles::list::<S>))
    .route("/articles/lookup", get(articles::lookup::<S>))
    .route("/status", get(articles::counts::<S>))
    // Insights
    .route("/insights", get(insights::list::<S>))
    .route("/insights/{date}", get(insights::get_one::<S>))
    .with_state(store)
}
