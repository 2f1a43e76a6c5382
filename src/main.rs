//! turbo-health
//!
//! Health check and diagnostics service for the LAMP/Turbo docker stack.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!   GET /health-check│  http ──▶ health aggregator ──▶ probes ──────┼──▶ database
//!   ─────────────────┼─▶  │              │                  ├────────┼──▶ redis
//!                    │    │              ▼                  └────────┼──▶ memcached
//!                    │    │         system sampler (disk, memory)    │
//!                    │    ├──▶ diagnostics (/, /dashboard, /info)    │
//!                    │    └──▶ not-found log (fallback → /404)       │
//!                    │                                              │
//!                    │  config · logging · metrics · lifecycle      │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use turbo_health::config::{load_config, ConfigOverrides};
use turbo_health::lifecycle::{signals, Shutdown};
use turbo_health::observability::{logging, metrics};
use turbo_health::HttpServer;

#[derive(Parser)]
#[command(name = "turbo-health")]
#[command(about = "Health check and diagnostics service for the LAMP/Turbo stack", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "TURBO_HEALTH_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding configuration and environment
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let overrides = ConfigOverrides { bind_address: args.bind };
    let config = load_config(args.config.as_deref(), overrides)?;

    logging::init_logging(&config.observability)?;
    tracing::info!("turbo-health v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        app_env = %config.stack.app_env,
        database = %format!("{}:{}", config.database.host, config.database.port),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
