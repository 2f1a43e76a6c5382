//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid, percentages)
//! - Check that the listener and metrics addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StackConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::StackConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0}: host must not be empty")]
    EmptyHost(&'static str),

    #[error("{0}: port must not be 0")]
    ZeroPort(&'static str),

    #[error("{0}: timeout must be at least 1 second")]
    ZeroTimeout(&'static str),

    #[error("disk.degraded_above_percent must be between 1 and 100, got {0}")]
    DiskThreshold(u8),

    #[error("not_found.max_entries must be at least 1")]
    ZeroNotFoundCapacity,

    #[error("timeouts.request_secs ({request}s) must exceed the slowest probe timeout ({probe}s)")]
    RequestTimeoutTooShort { request: u64, probe: u64 },
}

/// Validate a loaded configuration.
pub fn validate_config(config: &StackConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let services = [
        ("database", config.database.enabled, &config.database.host, config.database.port, config.database.timeout_secs),
        ("redis", config.redis.enabled, &config.redis.host, config.redis.port, config.redis.timeout_secs),
        ("memcached", config.memcached.enabled, &config.memcached.host, config.memcached.port, config.memcached.timeout_secs),
    ];

    let mut slowest_probe = 0;
    for (name, enabled, host, port, timeout_secs) in services {
        if !enabled {
            continue;
        }
        if host.trim().is_empty() {
            errors.push(ValidationError::EmptyHost(name));
        }
        if port == 0 {
            errors.push(ValidationError::ZeroPort(name));
        }
        if timeout_secs == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
        slowest_probe = slowest_probe.max(timeout_secs);
    }

    let threshold = config.disk.degraded_above_percent;
    if threshold == 0 || threshold > 100 {
        errors.push(ValidationError::DiskThreshold(threshold));
    }

    if config.not_found.max_entries == 0 {
        errors.push(ValidationError::ZeroNotFoundCapacity);
    }

    if config.timeouts.request_secs <= slowest_probe {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request: config.timeouts.request_secs,
            probe: slowest_probe,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&StackConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = StackConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.database.host = String::new();
        config.redis.port = 0;
        config.disk.degraded_above_percent = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::EmptyHost("database")));
        assert!(errors.contains(&ValidationError::ZeroPort("redis")));
        assert!(errors.contains(&ValidationError::DiskThreshold(0)));
    }

    #[test]
    fn test_disabled_service_is_not_checked() {
        let mut config = StackConfig::default();
        config.memcached.enabled = false;
        config.memcached.host = String::new();
        config.memcached.timeout_secs = 0;

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_not_found_log_needs_capacity() {
        let mut config = StackConfig::default();
        config.not_found.max_entries = 0;

        assert_eq!(validate_config(&config), Err(vec![ValidationError::ZeroNotFoundCapacity]));
    }

    #[test]
    fn test_request_timeout_must_cover_probes() {
        let mut config = StackConfig::default();
        config.database.timeout_secs = 15;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::RequestTimeoutTooShort { request: 10, probe: 15 }]
        );
        assert_eq!(
            errors[0].to_string(),
            "timeouts.request_secs (10s) must exceed the slowest probe timeout (15s)"
        );
    }
}
