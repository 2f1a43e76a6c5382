//! Memcached probe (`cache_b`), speaking the text protocol.

use std::time::Duration;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::config::MemcachedConfig;
use crate::health::probe::{Probe, ProbeError};
use crate::health::report::ServiceDetails;

/// Upper bound on `stats` lines; real servers send well under a hundred.
const MAX_STATS_LINES: usize = 512;

/// Longest reply line accepted, newline included.
const MAX_LINE_BYTES: u64 = 4096;

pub struct MemcachedProbe {
    name: String,
    config: MemcachedConfig,
}

impl MemcachedProbe {
    pub fn new(name: impl Into<String>, config: MemcachedConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

#[async_trait]
impl Probe for MemcachedProbe {
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
        let stream = TcpStream::connect(self.config.address()).await?;
        let (read, mut write) = stream.into_split();
        let mut reader = BufReader::new(read);

        write.write_all(b"version\r\n").await?;
        let line = read_line(&mut reader).await?;
        let version = line
            .strip_prefix("VERSION ")
            .ok_or_else(|| ProbeError::Protocol(format!("version answered {:?}", line)))?
            .to_string();

        write.write_all(b"stats\r\n").await?;
        let mut stats = Vec::new();
        loop {
            let line = read_line(&mut reader).await?;
            if line == "END" {
                break;
            }
            if line.starts_with("ERROR") || line.starts_with("SERVER_ERROR") {
                return Err(ProbeError::Protocol(format!("stats answered {:?}", line)));
            }
            if stats.len() >= MAX_STATS_LINES {
                return Err(ProbeError::Protocol("stats reply never ended".to_string()));
            }
            stats.push(line);
        }

        let _ = write.write_all(b"quit\r\n").await;

        let mut details = parse_stats(stats.iter().map(String::as_str));
        details.insert("version".to_string(), version.into());
        Ok(details)
    }
}

async fn read_line<R>(reader: &mut R) -> Result<String, ProbeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let n = (&mut *reader).take(MAX_LINE_BYTES).read_line(&mut line).await?;
    if n == 0 {
        return Err(ProbeError::Protocol("connection closed by server".to_string()));
    }
    if !line.ends_with('\n') && n as u64 >= MAX_LINE_BYTES {
        return Err(ProbeError::Protocol(format!(
            "reply line longer than {} bytes",
            MAX_LINE_BYTES
        )));
    }
    Ok(line.trim_end().to_string())
}

/// Pick the interesting `STAT` lines.
pub fn parse_stats<'a>(lines: impl Iterator<Item = &'a str>) -> ServiceDetails {
    let mut details = ServiceDetails::new();
    for line in lines {
        let mut parts = line.split_whitespace();
        if parts.next() != Some("STAT") {
            continue;
        }
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let label = match key {
            "uptime" => "uptime_seconds",
            "curr_items" => "curr_items",
            "bytes" => "bytes",
            "curr_connections" => "curr_connections",
            _ => continue,
        };
        if let Ok(n) = value.parse::<u64>() {
            details.insert(label.to_string(), n.into());
        }
    }
    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn config(port: u16) -> MemcachedConfig {
        MemcachedConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..MemcachedConfig::default()
        }
    }

    async fn start_mock_memcached(version_reply: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let (read, mut write) = socket.into_split();
                    let mut reader = BufReader::new(read);
                    let mut line = String::new();
                    while reader.read_line(&mut line).await.unwrap_or(0) > 0 {
                        let reply = match line.trim() {
                            "version" => version_reply,
                            "stats" => "STAT pid 1\r\nSTAT uptime 120\r\nSTAT curr_items 42\r\nSTAT bytes 2048\r\nEND\r\n",
                            _ => "",
                        };
                        if write.write_all(reply.as_bytes()).await.is_err() {
                            break;
                        }
                        line.clear();
                    }
                });
            }
        });
        port
    }

    #[test]
    fn test_parse_stats() {
        let details = parse_stats(
            ["STAT uptime 300", "STAT curr_items 7", "STAT bytes 99", "STAT pid 4", "garbage"]
                .into_iter(),
        );
        assert_eq!(details["uptime_seconds"], 300);
        assert_eq!(details["curr_items"], 7);
        assert_eq!(details["bytes"], 99);
        assert!(!details.contains_key("pid"));
    }

    #[tokio::test]
    async fn test_probe_against_mock_server() {
        let port = start_mock_memcached("VERSION 1.6.21\r\n").await;
        let probe = MemcachedProbe::new("cache_b", config(port));

        let details = probe.probe().await.unwrap();
        assert_eq!(details["version"], "1.6.21");
        assert_eq!(details["curr_items"], 42);
        assert_eq!(details["uptime_seconds"], 120);
    }

    #[tokio::test]
    async fn test_unexpected_version_reply() {
        let port = start_mock_memcached("ERROR\r\n").await;
        let probe = MemcachedProbe::new("cache_b", config(port));

        let err = probe.probe().await.unwrap_err();
        assert!(matches!(err, ProbeError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_endless_reply_line_is_rejected() {
        let flood: &'static str = Box::leak("x".repeat(1 << 20).into_boxed_str());
        let port = start_mock_memcached(flood).await;
        let probe = MemcachedProbe::new("cache_b", config(port));

        let err = probe.probe().await.unwrap_err();
        assert!(
            matches!(&err, ProbeError::Protocol(msg) if msg == "reply line longer than 4096 bytes"),
            "{err}"
        );
    }

    #[tokio::test]
    async fn test_reader_stops_at_line_limit() {
        let mut reader = BufReader::new(&b"VERSION 1.6.21\r\n"[..]);
        assert_eq!(read_line(&mut reader).await.unwrap(), "VERSION 1.6.21");

        let long = vec![b'a'; MAX_LINE_BYTES as usize + 10];
        let mut reader = BufReader::new(&long[..]);
        assert!(matches!(read_line(&mut reader).await, Err(ProbeError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let probe = MemcachedProbe::new("cache_b", config(1));
        let err = probe.probe().await.unwrap_err();
        assert!(matches!(err, ProbeError::ConnectionRefused(_)));
    }
}
