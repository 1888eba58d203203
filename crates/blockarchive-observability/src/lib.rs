//! # blockarchive-observability
//!
//! Logging and metrics for the block archiver.
//!
//! ## Built-in metrics
//! - `blockarchive.records_attempted`  — counter, tagged with role
//! - `blockarchive.records_appended`   — counter, tagged with role
//! - `blockarchive.append_failures`    — counter, tagged with role
//! - `blockarchive.payload_fallbacks`  — counter
//! - `blockarchive.snapshot_fallbacks` — counter
//! - `blockarchive.alt_chains`         — histogram of snapshot sizes
//!
//! ## Structured logging
//! Text or JSON logs through `tracing-subscriber`, with per-component levels.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::ArchiveMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
