//! Core types and trait definitions for the Brief news pipeline.
//!
//! This crate is deliberately free of HTTP, process and database dependencies.
//! Every other crate depends on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits.
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod article;
pub mod error;
pub mod insight;
pub mod store;

pub use error::{Error, Result};
