//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use turbo_health::{HttpServer, Shutdown, StackConfig};

/// A running server under test.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task.
    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

/// Configuration that never touches the real stack.
///
/// The database points at a closed port, both caches are disabled and the
/// disk threshold cannot trip on a busy CI host.
pub fn isolated_config(web_root: &std::path::Path) -> StackConfig {
    let mut config = StackConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.database.host = "127.0.0.1".to_string();
    config.database.port = 1;
    config.database.timeout_secs = 1;
    config.redis.enabled = false;
    config.memcached.enabled = false;
    config.disk.path = web_root.display().to_string();
    config.disk.degraded_above_percent = 100;
    config.stack.document_root = web_root.display().to_string();
    config.stack.vhost_dir = web_root.join("sites-enabled").display().to_string();
    config.timeouts.shutdown_grace_secs = 1;
    config
}

/// Bind an ephemeral port and serve `config` in the background.
pub async fn spawn_server(config: StackConfig) -> TestServer {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    TestServer { addr, shutdown, handle }
}

/// HTTP client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Start a mock memcached that answers `version` and `stats`.
pub async fn start_mock_memcached() -> u16 {
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
                        "version" => "VERSION 1.6.21\r\n",
                        "stats" => "STAT uptime 10\r\nSTAT curr_items 1\r\nSTAT bytes 64\r\nEND\r\n",
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

/// A port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}
