//! Redis probe (`cache_a`).

use std::time::Duration;
use async_trait::async_trait;
use url::Url;

use crate::config::RedisConfig;
use crate::health::probe::{Probe, ProbeError};
use crate::health::report::ServiceDetails;

pub struct RedisProbe {
    name: String,
    config: RedisConfig,
}

impl RedisProbe {
    pub fn new(name: impl Into<String>, config: RedisConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    /// `redis://[:password@]host:port/`, with the password percent-encoded.
    pub fn connection_url(&self) -> Result<Url, ProbeError> {
        let mut url = Url::parse(&format!("redis://{}/", self.config.address()))
            .map_err(|e| ProbeError::Io(format!("invalid redis address: {}", e)))?;
        if let Some(password) = &self.config.password {
            url.set_password(Some(password))
                .map_err(|_| ProbeError::Io("redis address cannot carry a password".to_string()))?;
        }
        Ok(url)
    }
}

#[async_trait]
impl Probe for RedisProbe {
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
        let client = ::redis::Client::open(self.connection_url()?.as_str()).map_err(map_redis_error)?;
        // AUTH happens during connection setup when a password is present.
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;

        let pong: String = ::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        if pong != "PONG" {
            return Err(ProbeError::Protocol(format!("PING answered {:?}", pong)));
        }

        let info: String = ::redis::cmd("INFO")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(parse_info(&info))
    }
}

/// Pick the interesting fields out of an `INFO` reply.
pub fn parse_info(info: &str) -> ServiceDetails {
    let mut details = ServiceDetails::new();
    for line in info.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        match key {
            "redis_version" => {
                details.insert("version".to_string(), value.into());
            }
            "used_memory_human" => {
                details.insert("memory".to_string(), value.into());
            }
            "uptime_in_seconds" => {
                if let Ok(secs) = value.parse::<u64>() {
                    details.insert("uptime_seconds".to_string(), secs.into());
                }
            }
            "connected_clients" => {
                if let Ok(n) = value.parse::<u64>() {
                    details.insert("connected_clients".to_string(), n.into());
                }
            }
            k if k.starts_with("db") && value.starts_with("keys=") => {
                let keys = value
                    .split(',')
                    .next()
                    .and_then(|kv| kv.strip_prefix("keys="))
                    .and_then(|n| n.parse::<u64>().ok());
                if let Some(keys) = keys {
                    let total = details
                        .get("keys")
                        .and_then(|v| v.as_u64())
                        .unwrap_or(0);
                    details.insert("keys".to_string(), (total + keys).into());
                }
            }
            _ => {}
        }
    }
    details
}

fn map_redis_error(e: ::redis::RedisError) -> ProbeError {
    if e.kind() == ::redis::ErrorKind::AuthenticationFailed {
        ProbeError::AuthFailure(e.to_string())
    } else if e.is_connection_refusal() {
        ProbeError::ConnectionRefused(e.to_string())
    } else if e.is_timeout() {
        ProbeError::ConnectionTimeout(None)
    } else if e.is_io_error() {
        ProbeError::Io(e.to_string())
    } else {
        ProbeError::Protocol(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    const INFO: &str = "# Server\r\nredis_version:7.2.4\r\nuptime_in_seconds:3600\r\n\r\n\
        # Clients\r\nconnected_clients:3\r\n\r\n# Memory\r\nused_memory_human:1.05M\r\n\r\n\
        # Keyspace\r\ndb0:keys=12,expires=0,avg_ttl=0\r\ndb2:keys=3,expires=1,avg_ttl=10\r\n";

    fn config(port: u16) -> RedisConfig {
        RedisConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..RedisConfig::default()
        }
    }

    /// Minimal RESP server: PING → PONG, INFO → fixed text, anything else → OK.
    async fn start_mock_redis() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let (read, mut write) = socket.into_split();
                    let mut reader = BufReader::new(read);
                    loop {
                        let mut header = String::new();
                        if reader.read_line(&mut header).await.unwrap_or(0) == 0 {
                            break;
                        }
                        let argc: usize = header.trim().trim_start_matches('*').parse().unwrap_or(0);
                        let mut args = Vec::with_capacity(argc);
                        for _ in 0..argc {
                            let mut len = String::new();
                            let mut arg = String::new();
                            reader.read_line(&mut len).await.unwrap();
                            reader.read_line(&mut arg).await.unwrap();
                            args.push(arg.trim().to_uppercase());
                        }
                        let reply = match args.first().map(String::as_str) {
                            Some("PING") => "+PONG\r\n".to_string(),
                            Some("INFO") => format!("${}\r\n{}\r\n", INFO.len(), INFO),
                            _ => "+OK\r\n".to_string(),
                        };
                        if write.write_all(reply.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });
        port
    }

    #[test]
    fn test_parse_info() {
        let details = parse_info(INFO);
        assert_eq!(details["version"], "7.2.4");
        assert_eq!(details["uptime_seconds"], 3600);
        assert_eq!(details["connected_clients"], 3);
        assert_eq!(details["memory"], "1.05M");
        assert_eq!(details["keys"], 15);
    }

    #[test]
    fn test_connection_url_encodes_password() {
        let mut cfg = config(6379);
        cfg.password = Some("p@ss/word".to_string());
        let url = RedisProbe::new("cache_a", cfg).connection_url().unwrap();
        assert_eq!(url.as_str(), "redis://:p%40ss%2Fword@127.0.0.1:6379/");

        let url = RedisProbe::new("cache_a", config(6380)).connection_url().unwrap();
        assert_eq!(url.as_str(), "redis://127.0.0.1:6380/");
    }

    #[tokio::test]
    async fn test_probe_against_mock_server() {
        let port = start_mock_redis().await;
        let probe = RedisProbe::new("cache_a", config(port));

        let details = probe.probe().await.unwrap();
        assert_eq!(details["version"], "7.2.4");
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let probe = RedisProbe::new("cache_a", config(1));
        let err = probe.probe().await.unwrap_err();
        assert!(matches!(err, ProbeError::ConnectionRefused(_)), "got {err:?}");
    }
}
