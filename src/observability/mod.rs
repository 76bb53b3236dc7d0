//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; request ID appears on every request span
//! - Metrics are cheap (atomic increments) and exported via Prometheus scrape

pub mod logging;
pub mod metrics;
