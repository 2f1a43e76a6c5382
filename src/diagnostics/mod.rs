//! Stack diagnostics: welcome page, dashboard, runtime info, DB test.
//!
//! # Data Flow
//! ```text
//! GET /            → pages.rs (static HTML)
//! GET /dashboard   → dashboard.rs (vhosts.rs + project dirs + DB line + top 404s)
//! GET /info[...]   → info.rs (production guard, build/runtime facts)
//! GET /test-db     → database probe, plain-text verdict
//! ```
//!
//! # Design Decisions
//! - Everything is read-only and recomputed per request
//! - Secrets never leave the process: info shows endpoints, not passwords

pub mod dashboard;
pub mod info;
pub mod pages;
pub mod vhosts;

use crate::health::report::ServiceStatus;
use crate::health::HealthAggregator;
use crate::probes::DATABASE;

pub const DB_TEST_SUCCESS: &str =
    "Success: A proper connection to MySQL was made! The docker database is great.";

/// Server version from a fresh database check, or why it failed.
pub async fn database_status(aggregator: &HealthAggregator) -> Result<String, String> {
    let result = aggregator
        .check_service(DATABASE)
        .await
        .ok_or_else(|| "database checks are disabled".to_string())?;

    match result.status {
        ServiceStatus::Connected => Ok(result
            .details
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string()),
        _ => Err(result.error.unwrap_or_else(|| result.status.as_str().to_string())),
    }
}

/// Body of `GET /test-db`.
pub async fn test_database(aggregator: &HealthAggregator) -> String {
    match database_status(aggregator).await {
        Ok(_) => DB_TEST_SUCCESS.to_string(),
        Err(e) => {
            tracing::info!(error = %e, "Database connectivity test failed");
            format!("Error: Unable to connect to MySQL. Error: {}", e)
        }
    }
}
