//! Regime Engine library crate.
//!
//! This crate compares the net take-home value of a Brazilian CLT
//! employment contract against a PJ (contractor) arrangement.  External
//! applications may depend on the `regime_engine` crate and call into
//! `engine::compare` directly or embed the API via `api::build_router`.

pub mod models;
pub mod tax;
pub mod engine;
pub mod validation;
pub mod export;
pub mod draft;
pub mod config;
pub mod api;

pub use engine::{compare, RegimeComparator};
pub use models::{CompensationInput, RegimeComparisonResult};
