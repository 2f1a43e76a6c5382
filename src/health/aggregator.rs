//! Health aggregation.
//!
//! # Responsibilities
//! - Run every configured probe under its own timeout
//! - Sample disk and memory
//! - Derive the overall status and build a fresh `HealthReport`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use futures_util::future::join_all;
use tokio::time;

use crate::config::StackConfig;
use crate::health::probe::{Probe, ProbeError};
use crate::health::report::{HealthReport, ServiceCheckResult};
use crate::observability::metrics;
use crate::probes::{build_probes, ProbeEntry};
use crate::system::{HostSampler, SystemSampler};

/// Answer to a health request.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthOutcome {
    /// Basic liveness answer; nothing was probed.
    PlainOk,
    Full(HealthReport),
}

/// Runs the probes and assembles health reports.
///
/// Stateless between calls: every `check_full` probes again from scratch.
pub struct HealthAggregator {
    /// Service slots in report order.
    slots: Vec<ProbeEntry>,
    sampler: Arc<dyn SystemSampler>,
    disk_path: PathBuf,
    disk_threshold_percent: u8,
    runtime_version: String,
}

impl HealthAggregator {
    /// Create an aggregator with no probes, sampling the host.
    pub fn new(disk_path: impl Into<PathBuf>, disk_threshold_percent: u8) -> Self {
        Self {
            slots: Vec::new(),
            sampler: Arc::new(HostSampler),
            disk_path: disk_path.into(),
            disk_threshold_percent,
            runtime_version: runtime_version(),
        }
    }

    /// Build the aggregator for the configured stack.
    pub fn from_config(config: &StackConfig) -> Self {
        let mut aggregator = Self::new(&config.disk.path, config.disk.degraded_above_percent);
        aggregator.slots = build_probes(config);
        aggregator
    }

    pub fn with_probe(mut self, probe: Arc<dyn Probe>) -> Self {
        self.slots.push(ProbeEntry::Enabled(probe));
        self
    }

    /// Report `name` as `disconnected` without probing it.
    pub fn with_disabled(mut self, name: impl Into<String>) -> Self {
        self.slots.push(ProbeEntry::Disabled(name.into()));
        self
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn SystemSampler>) -> Self {
        self.sampler = sampler;
        self
    }

    /// `GetHealth(full)`.
    pub async fn check(&self, full: bool) -> HealthOutcome {
        if full {
            HealthOutcome::Full(self.check_full().await)
        } else {
            HealthOutcome::PlainOk
        }
    }

    /// Probe everything concurrently and build a report.
    pub async fn check_full(&self) -> HealthReport {
        let services = join_all(self.slots.iter().map(|slot| async move {
            match slot {
                ProbeEntry::Enabled(probe) => run_probe(probe.as_ref()).await,
                ProbeEntry::Disabled(name) => ServiceCheckResult::disconnected(name.as_str()),
            }
        }))
        .await;

        let disk = match self.sampler.disk_usage(&self.disk_path) {
            Ok(usage) => Some(usage),
            Err(e) => {
                tracing::warn!(path = %self.disk_path.display(), error = %e, "Disk usage unavailable");
                None
            }
        };
        let memory = self.sampler.memory_usage();

        let overall_status =
            HealthReport::derive_status(&services, disk.as_ref(), self.disk_threshold_percent);
        metrics::record_overall_status(overall_status);

        tracing::debug!(
            status = %overall_status,
            services = services.len(),
            used_percent = disk.map(|d| d.used_percent()),
            "Health report computed"
        );

        HealthReport {
            overall_status,
            timestamp: chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
            runtime_version: self.runtime_version.clone(),
            disk,
            memory,
            services,
        }
    }

    /// Run only the probe registered as `name`.
    ///
    /// `None` when no enabled probe has that name.
    pub async fn check_service(&self, name: &str) -> Option<ServiceCheckResult> {
        let probe = self.slots.iter().find_map(|slot| match slot {
            ProbeEntry::Enabled(probe) if probe.name() == name => Some(probe),
            _ => None,
        })?;
        Some(run_probe(probe.as_ref()).await)
    }
}

/// One probe under its own deadline; every failure becomes a typed result.
async fn run_probe(probe: &dyn Probe) -> ServiceCheckResult {
    let start = Instant::now();
    let bound = probe.timeout();

    let outcome = match time::timeout(bound, probe.probe()).await {
        Ok(Err(ProbeError::ConnectionTimeout(None))) | Err(_) => {
            Err(ProbeError::ConnectionTimeout(Some(bound)))
        }
        Ok(result) => result,
    };
    let latency = start.elapsed();

    let result = match outcome {
        Ok(details) => ServiceCheckResult::connected(probe.name(), probe.critical(), details),
        Err(e) => {
            tracing::warn!(
                service = probe.name(),
                critical = probe.critical(),
                kind = e.kind(),
                error = %e,
                "Probe failed"
            );
            ServiceCheckResult::failed(probe.name(), probe.critical(), e.status(), e.to_string())
        }
    }
    .with_latency(latency);

    metrics::record_probe(probe.name(), result.status, latency);
    result
}

/// `<package>/<version>` of this build.
pub fn runtime_version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
