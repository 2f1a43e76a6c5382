//! Health check and diagnostics service for the LAMP/Turbo docker stack.

// Core
pub mod config;
pub mod health;
pub mod probes;
pub mod system;

// Surfaces
pub mod diagnostics;
pub mod http;
pub mod not_found;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::StackConfig;
pub use health::{HealthAggregator, HealthOutcome, HealthReport};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
