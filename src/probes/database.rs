//! MySQL/MariaDB probe.

use std::time::Duration;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};

use crate::config::DatabaseConfig;
use crate::health::probe::{Probe, ProbeError};
use crate::health::report::ServiceDetails;

/// SQLSTATE for rejected credentials (MySQL error 1045).
const SQLSTATE_ACCESS_DENIED: &str = "28000";

pub struct DatabaseProbe {
    name: String,
    config: DatabaseConfig,
}

impl DatabaseProbe {
    pub fn new(name: impl Into<String>, config: DatabaseConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(&self.config.password)
            .database(&self.config.database)
            .disable_statement_logging()
    }

    /// Connect, read the server version, disconnect.
    async fn server_version(&self) -> Result<String, ProbeError> {
        let mut conn: MySqlConnection = self
            .connect_options()
            .connect()
            .await
            .map_err(map_sqlx_error)?;

        let version: String = sqlx::query_scalar("SELECT VERSION()")
            .fetch_one(&mut conn)
            .await
            .map_err(map_sqlx_error)?;

        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "Database connection did not close cleanly");
        }
        Ok(version)
    }
}

#[async_trait]
impl Probe for DatabaseProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn critical(&self) -> bool {
        self.config.critical
    }

    fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    async fn probe(&self) -> Result<ServiceDetails, ProbeError> {
        let version = self.server_version().await?;

        let mut details = ServiceDetails::new();
        details.insert("version".to_string(), version.into());
        details.insert(
            "host".to_string(),
            format!("{}:{}", self.config.host, self.config.port).into(),
        );
        Ok(details)
    }
}

fn map_sqlx_error(e: sqlx::Error) -> ProbeError {
    match e {
        sqlx::Error::Io(io) => ProbeError::from(io),
        sqlx::Error::PoolTimedOut => ProbeError::ConnectionTimeout(None),
        sqlx::Error::Database(db) => {
            if db.code().as_deref() == Some(SQLSTATE_ACCESS_DENIED) {
                ProbeError::AuthFailure(db.message().to_string())
            } else {
                ProbeError::Protocol(db.message().to_string())
            }
        }
        sqlx::Error::Protocol(msg) => ProbeError::Protocol(msg),
        other => ProbeError::Io(other.to_string()),
    }
}
