//! # lockbridge
//!
//! Back-office broker between a hotel admin UI and a third-party
//! smart-lock cloud platform. Owns the vendor credential lifecycle,
//! executes and normalizes every vendor call, and aggregates per-lock
//! queries into cross-lock views.
//!
//! Modules:
//! - `credentials` — TokenSet lifecycle: acquisition, refresh, durable storage
//! - `vendor` — request dispatcher, endpoint wrappers, fan-out aggregator
//! - `server` — thin axum adapters for the admin UI
//! - `config` — YAML service configuration

pub mod config;
pub mod credentials;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod resilience;
pub mod server;
pub mod tests;
pub mod utils;
pub mod vendor;

pub use crate::config::types::ServiceConfig;
pub use crate::error::Error;
