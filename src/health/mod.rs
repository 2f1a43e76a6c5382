//! Health aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health-check?full=1
//!     → aggregator.rs (fan out probes, each under its own timeout)
//!     → probe.rs (typed ProbeError per service)
//!     → system sampler (disk + memory)
//!     → report.rs (derive overall status, serialize)
//! ```
//!
//! # Design Decisions
//! - Reports are recomputed on every request; nothing is cached
//! - Probe failures become per-service results and never escape
//! - Only critical services and the disk can degrade the stack

pub mod aggregator;
pub mod probe;
pub mod report;

pub use aggregator::{HealthAggregator, HealthOutcome};
pub use probe::{Probe, ProbeError};
pub use report::{HealthReport, OverallStatus, ServiceCheckResult, ServiceStatus};
