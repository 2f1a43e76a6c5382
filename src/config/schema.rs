//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Root configuration for the health service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StackConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Primary database (critical by default).
    pub database: DatabaseConfig,

    /// Key-value cache, Redis protocol ("cache_a").
    pub redis: RedisConfig,

    /// Key-value cache, Memcached protocol ("cache_b").
    pub memcached: MemcachedConfig,

    /// Disk threshold settings.
    pub disk: DiskConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Stack layout used by the diagnostic pages.
    pub stack: StackLayoutConfig,

    /// Not-found log settings.
    pub not_found: NotFoundConfig,
}

impl StackConfig {
    /// Whether diagnostic pages must be hidden.
    pub fn is_production(&self) -> bool {
        self.stack.app_env.eq_ignore_ascii_case("production")
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// MySQL/MariaDB connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Probe this service at all.
    pub enabled: bool,

    /// Whether a failure degrades the overall status.
    pub critical: bool,

    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,

    #[serde(skip_serializing)]
    pub password: String,

    /// Connect timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            critical: true,
            host: "database".to_string(),
            port: 3306,
            database: "docker".to_string(),
            user: "docker".to_string(),
            password: "docker".to_string(),
            timeout_secs: 3,
        }
    }
}

impl DatabaseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Redis connection settings ("cache_a").
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Probe this service at all.
    pub enabled: bool,

    /// Whether a failure degrades the overall status.
    pub critical: bool,

    pub host: String,
    pub port: u16,

    /// Optional AUTH secret.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Connect/ping timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            critical: false,
            host: "redis".to_string(),
            port: 6379,
            password: None,
            timeout_secs: 2,
        }
    }
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `host:port` string used for connecting and logging.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Memcached connection settings ("cache_b").
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MemcachedConfig {
    /// Probe this service at all.
    pub enabled: bool,

    /// Whether a failure degrades the overall status.
    pub critical: bool,

    pub host: String,
    pub port: u16,

    /// Connect/version timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for MemcachedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            critical: false,
            host: "memcached".to_string(),
            port: 11211,
            timeout_secs: 2,
        }
    }
}

impl MemcachedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `host:port` string used for connecting and logging.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Disk usage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiskConfig {
    /// Path whose filesystem is measured.
    pub path: String,

    /// Used percentage above which the stack is degraded.
    pub degraded_above_percent: u8,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            path: "/var/www/html".to_string(),
            degraded_above_percent: 90,
        }
    }
}

/// Timeout configuration for the HTTP side.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 10,
            shutdown_grace_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Layout of the development stack.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StackLayoutConfig {
    /// "development" or "production". Diagnostics are refused in production.
    pub app_env: String,

    /// Document root as seen inside the web container.
    pub document_root: String,

    /// Document root as seen on the host (for the dashboard).
    pub local_document_root: String,

    /// Directory holding the virtual host `*.conf` files.
    pub vhost_dir: String,

    /// Directory (under the document root) holding per-domain applications.
    pub applications_dir: String,

    /// phpMyAdmin port shown on the dashboard.
    pub pma_port: u16,

    /// Mailpit port shown on the dashboard.
    pub mailpit_port: u16,
}

impl Default for StackLayoutConfig {
    fn default() -> Self {
        Self {
            app_env: "development".to_string(),
            document_root: "/var/www/html".to_string(),
            local_document_root: "./www".to_string(),
            vhost_dir: "/etc/apache2/sites-enabled".to_string(),
            applications_dir: "applications".to_string(),
            pma_port: 8080,
            mailpit_port: 8025,
        }
    }
}

/// Not-found log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotFoundConfig {
    /// JSON file the log is loaded from at startup and saved to on shutdown.
    pub persist_path: Option<String>,

    /// Distinct (uri, referer, client) entries kept; new ones are dropped past this.
    pub max_entries: usize,
}

impl Default for NotFoundConfig {
    fn default() -> Self {
        Self {
            persist_path: None,
            max_entries: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stack_containers() {
        let config = StackConfig::default();
        assert_eq!(config.database.host, "database");
        assert_eq!(config.database.timeout(), Duration::from_secs(3));
        assert!(config.database.critical);
        assert_eq!(config.redis.address(), "redis:6379");
        assert!(!config.redis.critical);
        assert_eq!(config.memcached.address(), "memcached:11211");
        assert_eq!(config.memcached.timeout(), Duration::from_secs(2));
        assert_eq!(config.disk.degraded_above_percent, 90);
        assert!(!config.is_production());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: StackConfig = toml::from_str(
            r#"
            [database]
            host = "db.internal"

            [stack]
            app_env = "Production"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.memcached.port, 11211);
        assert!(config.is_production());
    }

    #[test]
    fn test_secrets_not_serialized() {
        let mut config = StackConfig::default();
        config.redis.password = Some("hunter2".to_string());
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("password"));
    }
}
