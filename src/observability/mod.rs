//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (docker logs, stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`service = ..., status = ...`) over formatted strings
//! - Request ID (tower-http) attached to every request span
//! - Metrics are optional; recording without an exporter costs nothing

pub mod logging;
pub mod metrics;
