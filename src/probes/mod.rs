//! Probes for the stack's dependent services.
//!
//! # Services
//! - `database` (database.rs): MySQL/MariaDB, connect + `SELECT VERSION()`
//! - `cache_a` (redis.rs): Redis, optional AUTH + `PING` + `INFO`
//! - `cache_b` (memcached.rs): Memcached text protocol, `version` + `stats`
//!
//! # Design Decisions
//! - Every probe is read-only and opens a fresh connection (no pools)
//! - Cache clients are cargo features; a build without one reports
//!   `extension_missing` for that service
//! - Probes never retry; one attempt per request

pub mod database;
#[cfg(feature = "memcached")]
pub mod memcached;
#[cfg(feature = "redis")]
pub mod redis;

use std::sync::Arc;

use crate::config::StackConfig;
use crate::health::probe::Probe;

pub const DATABASE: &str = "database";
pub const CACHE_A: &str = "cache_a";
pub const CACHE_B: &str = "cache_b";

/// A configured service slot.
pub enum ProbeEntry {
    Enabled(Arc<dyn Probe>),
    /// Turned off in configuration; reported as `disconnected`.
    Disabled(String),
}

/// Build the probes for every service in `config`, in report order.
pub fn build_probes(config: &StackConfig) -> Vec<ProbeEntry> {
    let mut entries = Vec::with_capacity(3);

    entries.push(if config.database.enabled {
        ProbeEntry::Enabled(Arc::new(database::DatabaseProbe::new(DATABASE, config.database.clone())))
    } else {
        ProbeEntry::Disabled(DATABASE.to_string())
    });

    entries.push(if config.redis.enabled {
        ProbeEntry::Enabled(redis_probe(config))
    } else {
        ProbeEntry::Disabled(CACHE_A.to_string())
    });

    entries.push(if config.memcached.enabled {
        ProbeEntry::Enabled(memcached_probe(config))
    } else {
        ProbeEntry::Disabled(CACHE_B.to_string())
    });

    entries
}

#[cfg(feature = "redis")]
fn redis_probe(config: &StackConfig) -> Arc<dyn Probe> {
    Arc::new(redis::RedisProbe::new(CACHE_A, config.redis.clone()))
}

#[cfg(not(feature = "redis"))]
fn redis_probe(config: &StackConfig) -> Arc<dyn Probe> {
    Arc::new(crate::health::probe::UnavailableProbe::new(CACHE_A, "redis", config.redis.critical))
}

#[cfg(feature = "memcached")]
fn memcached_probe(config: &StackConfig) -> Arc<dyn Probe> {
    Arc::new(memcached::MemcachedProbe::new(CACHE_B, config.memcached.clone()))
}

#[cfg(not(feature = "memcached"))]
fn memcached_probe(config: &StackConfig) -> Arc<dyn Probe> {
    Arc::new(crate::health::probe::UnavailableProbe::new(CACHE_B, "memcached", config.memcached.critical))
}

/// Probe clients compiled into this build, sorted.
pub fn compiled_clients() -> Vec<&'static str> {
    let mut clients = vec!["mysql"];
    if cfg!(feature = "memcached") {
        clients.push("memcached");
    }
    if cfg!(feature = "redis") {
        clients.push("redis");
    }
    clients.sort_unstable();
    clients
}
