//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → container environment: DB_HOST, MYSQL_*, REDIS_*, ... (loader.rs)
//!     → CLI flags (ConfigOverrides from main.rs)
//!     → validation.rs (semantic checks)
//!     → StackConfig (validated, immutable)
//!     → passed explicitly to the aggregator and handlers
//! ```
//!
//! # Design Decisions
//! - Config is built once at process start; there is no reload path
//! - All fields have defaults matching the docker stack's containers
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigOverrides};
pub use schema::StackConfig;
pub use schema::{
    DatabaseConfig, DiskConfig, ListenerConfig, MemcachedConfig, NotFoundConfig,
    ObservabilityConfig, RedisConfig, StackLayoutConfig, TimeoutConfig,
};
