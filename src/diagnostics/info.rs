//! `/info` and `/info/extensions`.

use serde::Serialize;

use crate::config::StackConfig;
use crate::diagnostics::pages;
use crate::health::aggregator::runtime_version;
use crate::probes::{compiled_clients, CACHE_A, CACHE_B, DATABASE};

pub const PRODUCTION_DENIED: &str = "Access denied in production environment";

#[derive(Debug, Serialize)]
pub struct RuntimeInfo {
    pub package: &'static str,
    pub version: &'static str,
    pub server_software: String,
    pub platform: String,
    pub app_env: String,
    pub document_root: String,
    pub probe_clients: Vec<&'static str>,
    pub services: Vec<ServiceEndpoint>,
}

/// Where a service is probed; credentials are left out.
#[derive(Debug, Serialize)]
pub struct ServiceEndpoint {
    pub name: &'static str,
    pub address: String,
    pub enabled: bool,
    pub critical: bool,
    pub timeout_secs: u64,
}

pub fn runtime_info(config: &StackConfig) -> RuntimeInfo {
    RuntimeInfo {
        package: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        server_software: runtime_version(),
        platform: pages::platform(),
        app_env: config.stack.app_env.clone(),
        document_root: config.stack.document_root.clone(),
        probe_clients: compiled_clients(),
        services: vec![
            ServiceEndpoint {
                name: DATABASE,
                address: format!(
                    "{}:{}/{}",
                    config.database.host, config.database.port, config.database.database
                ),
                enabled: config.database.enabled,
                critical: config.database.critical,
                timeout_secs: config.database.timeout_secs,
            },
            ServiceEndpoint {
                name: CACHE_A,
                address: config.redis.address(),
                enabled: config.redis.enabled,
                critical: config.redis.critical,
                timeout_secs: config.redis.timeout_secs,
            },
            ServiceEndpoint {
                name: CACHE_B,
                address: config.memcached.address(),
                enabled: config.memcached.enabled,
                critical: config.memcached.critical,
                timeout_secs: config.memcached.timeout_secs,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_info_hides_credentials() {
        let mut config = StackConfig::default();
        config.database.password = "s3cret".to_string();
        config.redis.password = Some("hunter2".to_string());

        let json = serde_json::to_string(&runtime_info(&config)).unwrap();
        assert!(!json.contains("s3cret"));
        assert!(!json.contains("hunter2"));
        assert!(json.contains("database:3306/docker"));
        assert!(json.contains("\"mysql\""));
    }
}
