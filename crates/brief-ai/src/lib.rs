//! AI engine layer for Brief.
//!
//! Two interchangeable backends are driven as external executables behind the
//! uniform [`AiBackend`] interface. The [`EngineRouter`] picks one per request
//! according to an [`EnginePolicy`] and applies the hybrid fallback.
//!
//! Nothing in this crate returns an error to its callers: every failure is
//! logged and surfaces as `None`, so each stage applies its own retry/skip
//! policy.

#![allow(async_fn_in_trait)]

pub mod backend;
pub mod cli;
pub mod envelope;
pub mod error;
pub mod router;
pub mod util;

pub use backend::AiBackend;
pub use cli::{CliBackend, CliBackendConfig, CliFlavor};
pub use error::{EnvelopeError, InvokeError};
pub use router::{Completion, Engine, EnginePolicy, EngineRouter, Purpose, RotationCounter};
