//! Health report types and their JSON rendering.

use std::collections::BTreeMap;
use std::time::Duration;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Free-form per-service details (version, memory, uptime, item counts).
pub type ServiceDetails = BTreeMap<String, serde_json::Value>;

const BYTES_PER_GIB: f64 = 1_073_741_824.0;
const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Outcome of one service probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Connected,
    Error,
    /// The client for this service is not compiled in.
    ExtensionMissing,
    /// Probing is disabled in configuration.
    Disconnected,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Connected => "connected",
            ServiceStatus::Error => "error",
            ServiceStatus::ExtensionMissing => "extension_missing",
            ServiceStatus::Disconnected => "disconnected",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall stack health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Healthy => "healthy",
            OverallStatus::Degraded => "degraded",
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single service check.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCheckResult {
    pub name: String,
    pub status: ServiceStatus,
    /// Whether a failure of this service degrades the stack.
    pub critical: bool,
    pub latency: Duration,
    pub error: Option<String>,
    pub details: ServiceDetails,
}

impl ServiceCheckResult {
    pub fn connected(name: impl Into<String>, critical: bool, details: ServiceDetails) -> Self {
        Self {
            name: name.into(),
            status: ServiceStatus::Connected,
            critical,
            latency: Duration::ZERO,
            error: None,
            details,
        }
    }

    pub fn failed(
        name: impl Into<String>,
        critical: bool,
        status: ServiceStatus,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            critical,
            latency: Duration::ZERO,
            error: Some(error.into()),
            details: ServiceDetails::new(),
        }
    }

    pub fn disconnected(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ServiceStatus::Disconnected,
            critical: false,
            latency: Duration::ZERO,
            error: None,
            details: ServiceDetails::new(),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// A critical service that is not connected.
    ///
    /// Disabled services never count, whatever their `critical` flag says.
    pub fn fails_critically(&self) -> bool {
        self.critical
            && !matches!(self.status, ServiceStatus::Connected | ServiceStatus::Disconnected)
    }
}

/// Disk usage of the web root filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub free_bytes: u64,
    pub total_bytes: u64,
}

impl DiskUsage {
    /// Used space as a whole percentage, rounded half away from zero.
    pub fn used_percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 0;
        }
        let used = self.total_bytes.saturating_sub(self.free_bytes) as f64;
        (used / self.total_bytes as f64 * 100.0).round().clamp(0.0, 100.0) as u8
    }

    pub fn free_gb(&self) -> f64 {
        round2(self.free_bytes as f64 / BYTES_PER_GIB)
    }

    pub fn total_gb(&self) -> f64 {
        round2(self.total_bytes as f64 / BYTES_PER_GIB)
    }
}

/// Process memory usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub peak_bytes: u64,
}

impl MemoryUsage {
    pub fn used_mb(&self) -> f64 {
        round2(self.used_bytes as f64 / BYTES_PER_MIB)
    }

    pub fn peak_mb(&self) -> f64 {
        round2(self.peak_bytes as f64 / BYTES_PER_MIB)
    }
}

/// Aggregated, freshly computed stack health.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub overall_status: OverallStatus,
    /// ISO-8601 with offset.
    pub timestamp: String,
    pub runtime_version: String,
    /// `None` when the filesystem could not be sampled.
    pub disk: Option<DiskUsage>,
    pub memory: MemoryUsage,
    pub services: Vec<ServiceCheckResult>,
}

impl HealthReport {
    /// Derive the overall status from service results and disk usage.
    pub fn derive_status(
        services: &[ServiceCheckResult],
        disk: Option<&DiskUsage>,
        disk_threshold_percent: u8,
    ) -> OverallStatus {
        let service_failed = services.iter().any(ServiceCheckResult::fails_critically);
        let disk_full = match disk {
            Some(disk) => disk.used_percent() > disk_threshold_percent,
            None => true,
        };

        if service_failed || disk_full {
            OverallStatus::Degraded
        } else {
            OverallStatus::Healthy
        }
    }

    pub fn service(&self, name: &str) -> Option<&ServiceCheckResult> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Wire representation served on `/health-check?full=1`.
    pub fn to_json(&self) -> HealthJson<'_> {
        HealthJson {
            status: self.overall_status,
            timestamp: &self.timestamp,
            runtime_version: &self.runtime_version,
            services: ServiceStatuses(&self.services),
            disk: self.disk.map(|d| DiskJson {
                free_gb: d.free_gb(),
                total_gb: d.total_gb(),
                used_percent: d.used_percent(),
            }),
            memory: MemoryJson {
                used_mb: self.memory.used_mb(),
                peak_mb: self.memory.peak_mb(),
            },
            details: ServiceDetailsView(&self.services),
        }
    }
}

#[derive(Serialize)]
pub struct HealthJson<'a> {
    status: OverallStatus,
    timestamp: &'a str,
    runtime_version: &'a str,
    services: ServiceStatuses<'a>,
    disk: Option<DiskJson>,
    memory: MemoryJson,
    #[serde(skip_serializing_if = "ServiceDetailsView::is_empty")]
    details: ServiceDetailsView<'a>,
}

#[derive(Serialize)]
struct DiskJson {
    free_gb: f64,
    total_gb: f64,
    used_percent: u8,
}

#[derive(Serialize)]
struct MemoryJson {
    used_mb: f64,
    peak_mb: f64,
}

/// `{"database": "connected", ...}` in probe order.
struct ServiceStatuses<'a>(&'a [ServiceCheckResult]);

impl Serialize for ServiceStatuses<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for service in self.0 {
            map.serialize_entry(&service.name, &service.status)?;
        }
        map.end()
    }
}

/// Per-service details plus latency and error, for services that produced any.
struct ServiceDetailsView<'a>(&'a [ServiceCheckResult]);

impl ServiceDetailsView<'_> {
    fn has_details(service: &ServiceCheckResult) -> bool {
        !service.details.is_empty() || service.error.is_some()
    }

    fn is_empty(&self) -> bool {
        !self.0.iter().any(Self::has_details)
    }
}

impl Serialize for ServiceDetailsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for service in self.0.iter().filter(|s| Self::has_details(s)) {
            let mut entry = service.details.clone();
            entry.insert(
                "latency_ms".to_string(),
                serde_json::Value::from(service.latency.as_millis() as u64),
            );
            if let Some(error) = &service.error {
                entry.insert("error".to_string(), serde_json::Value::from(error.as_str()));
            }
            map.serialize_entry(&service.name, &entry)?;
        }
        map.end()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
