//! Configuration loading from disk and the container environment.

use std::path::Path;
use std::fs;
use crate::config::schema::StackConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { key: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { key, value } => {
                write!(f, "Invalid value for {}: {:?}", key, value)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Command-line values that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
}

/// Build the configuration once at startup.
///
/// Layers: defaults, then the optional TOML file, then the process
/// environment, then `overrides`. The result is validated before it is returned.
pub fn load_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<StackConfig, ConfigError> {
    resolve_config(path, |key| std::env::var(key).ok(), overrides)
}

fn resolve_config<F>(
    path: Option<&Path>,
    lookup: F,
    overrides: ConfigOverrides,
) -> Result<StackConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => StackConfig::default(),
    };

    apply_env(&mut config, lookup)?;
    if let Some(bind) = overrides.bind_address {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file without environment overrides or validation.
pub fn read_config_file(path: &Path) -> Result<StackConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Apply the stack's environment variables on top of `config`.
///
/// `lookup` is the variable source; empty values count as unset, the same way
/// the compose files leave optional secrets blank.
pub fn apply_env<F>(config: &mut StackConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("HEALTH_BIND_ADDRESS") {
        config.listener.bind_address = v;
    }

    if let Some(v) = get("DB_HOST") {
        config.database.host = v;
    }
    if let Some(v) = get("DB_PORT") {
        config.database.port = parse_port("DB_PORT", v)?;
    }
    if let Some(v) = get("MYSQL_DATABASE") {
        config.database.database = v;
    }
    if let Some(v) = get("MYSQL_USER") {
        config.database.user = v;
    }
    if let Some(v) = get("MYSQL_PASSWORD") {
        config.database.password = v;
    }

    if let Some(v) = get("REDIS_HOST") {
        config.redis.host = v;
    }
    if let Some(v) = get("REDIS_PORT") {
        config.redis.port = parse_port("REDIS_PORT", v)?;
    }
    if let Some(v) = get("REDIS_PASSWORD") {
        config.redis.password = Some(v);
    }

    if let Some(v) = get("MEMCACHED_HOST") {
        config.memcached.host = v;
    }
    if let Some(v) = get("MEMCACHED_PORT") {
        config.memcached.port = parse_port("MEMCACHED_PORT", v)?;
    }

    if let Some(v) = get("APP_ENV") {
        config.stack.app_env = v;
    }
    if let Some(v) = get("APACHE_DOCUMENT_ROOT") {
        config.disk.path = v.clone();
        config.stack.document_root = v;
    }

    Ok(())
}

fn parse_port(key: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { key, value })
}
