//! The Brief news pipeline.
//!
//! Five fixed stages advance articles through the persisted status machine:
//!
//! ```text
//! ingest ─► filter ─► scrape ─► analyze ─► insight
//! fetched   filtered_in/out  scraped  analyzed   daily_insights
//! ```
//!
//! Every stage selects its input from the [`ArticleStore`] by status and
//! writes back per item, so an interrupted run resumes where it stopped.
//! External systems (feeds, page extraction, notifications) are reached
//! through the traits in [`collab`]; models are reached through
//! [`brief_ai::Engine`].
//!
//! [`ArticleStore`]: brief_core::store::ArticleStore

#![allow(async_fn_in_trait)]

pub mod analyze;
pub mod collab;
pub mod config;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod insight;
pub mod payload;
pub mod report;
pub mod run;
pub mod scrape;

#[cfg(test)]
mod testing;

pub use config::{FeedConfig, PipelineConfig, SamplingConfig, ScrapeConfig};
pub use error::{Error, Result};
pub use run::{Pipeline, RunReport, RunSummary};
