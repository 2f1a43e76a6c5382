//! Probe abstraction shared by all dependent services.

use std::time::Duration;
use async_trait::async_trait;
use thiserror::Error;

use crate::health::report::{ServiceDetails, ServiceStatus};

/// Why a probe did not reach its service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Carries the deadline when the caller enforced one.
    #[error("connection timed out{}", .0.map(|d| format!(" after {:?}", d)).unwrap_or_default())]
    ConnectionTimeout(Option<Duration>),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("authentication failed: {0}")]
    AuthFailure(String),

    /// The client library for this service is not compiled in.
    #[error("{0} client not available")]
    ClientUnavailable(&'static str),

    #[error("unexpected reply: {0}")]
    Protocol(String),

    #[error("{0}")]
    Io(String),
}

impl ProbeError {
    /// Status string the failure is reported as.
    pub fn status(&self) -> ServiceStatus {
        match self {
            ProbeError::ClientUnavailable(_) => ServiceStatus::ExtensionMissing,
            _ => ServiceStatus::Error,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::ConnectionTimeout(_) => "timeout",
            ProbeError::ConnectionRefused(_) => "refused",
            ProbeError::AuthFailure(_) => "auth",
            ProbeError::ClientUnavailable(_) => "client_unavailable",
            ProbeError::Protocol(_) => "protocol",
            ProbeError::Io(_) => "io",
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::ConnectionRefused => ProbeError::ConnectionRefused(e.to_string()),
            std::io::ErrorKind::TimedOut => ProbeError::ConnectionTimeout(None),
            _ => ProbeError::Io(e.to_string()),
        }
    }
}

/// A bounded-time, read-only connectivity check against one service.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Key under which the result is reported (`database`, `cache_a`, ...).
    fn name(&self) -> &str;

    /// Whether a failure degrades the overall status.
    fn critical(&self) -> bool;

    /// Upper bound for one probe; the aggregator enforces it.
    fn timeout(&self) -> Duration;

    /// Connect, ping, and collect whatever details the service offers.
    async fn probe(&self) -> Result<ServiceDetails, ProbeError>;
}

/// Stand-in for a service whose client is not compiled into this build.
pub struct UnavailableProbe {
    name: String,
    client: &'static str,
    critical: bool,
}

impl UnavailableProbe {
    pub fn new(name: impl Into<String>, client: &'static str, critical: bool) -> Self {
        Self {
            name: name.into(),
            client,
            critical,
        }
    }
}

#[async_trait]
impl Probe for UnavailableProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn critical(&self) -> bool {
        self.critical
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn probe(&self) -> Result<ServiceDetails, ProbeError> {
        Err(ProbeError::ClientUnavailable(self.client))
    }
}
