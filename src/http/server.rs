//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, security headers, metrics)
//! - Serve until shutdown, then persist the not-found log

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::StackConfig;
use crate::health::HealthAggregator;
use crate::http::handlers;
use crate::http::response::SECURITY_HEADERS;
use crate::lifecycle::shutdown::recv_shutdown;
use crate::not_found::NotFoundLog;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<StackConfig>,
    pub aggregator: Arc<HealthAggregator>,
    pub not_found: NotFoundLog,
}

/// HTTP server for the health and diagnostics endpoints.
pub struct HttpServer {
    router: Router,
    config: Arc<StackConfig>,
    not_found: NotFoundLog,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: StackConfig) -> Self {
        let aggregator = HealthAggregator::from_config(&config);
        Self::with_aggregator(config, aggregator)
    }

    /// Create a server around a prepared aggregator.
    pub fn with_aggregator(config: StackConfig, aggregator: HealthAggregator) -> Self {
        let not_found = open_not_found_log(&config);
        let config = Arc::new(config);

        let state = AppState {
            config: config.clone(),
            aggregator: Arc::new(aggregator),
            not_found: not_found.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            not_found,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &StackConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/health-check", get(handlers::health_check))
            .route("/health-check.php", get(handlers::health_check))
            .route("/", get(handlers::welcome))
            .route("/dashboard", get(handlers::dashboard))
            .route("/info", get(handlers::runtime_info))
            .route("/info/extensions", get(handlers::extensions))
            .route("/test-db", get(handlers::test_db))
            .route(handlers::NOT_FOUND_PATH, get(handlers::not_found_page))
            .fallback(handlers::log_not_found)
            .with_state(state)
            .layer(middleware::from_fn(track_metrics));

        for (name, value) in SECURITY_HEADERS {
            router = router.layer(SetResponseHeaderLayer::if_not_present(
                name,
                HeaderValue::from_static(value),
            ));
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// Run the server until `shutdown` fires.
    ///
    /// In-flight requests get `timeouts.shutdown_grace_secs` to finish.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        let deadline = shutdown.resubscribe();
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                recv_shutdown(shutdown).await;
                tracing::info!("Draining in-flight requests");
            })
            .into_future();

        tokio::select! {
            result = serve => result?,
            _ = async {
                recv_shutdown(deadline).await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(grace_secs = grace.as_secs(), "Grace period elapsed, closing open connections");
            }
        }

        let not_found = self.not_found.clone();
        match tokio::task::spawn_blocking(move || not_found.save_to_file()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Failed to persist not-found log"),
            Err(e) => tracing::error!(error = %e, "Not-found log save did not complete"),
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn open_not_found_log(config: &StackConfig) -> NotFoundLog {
    let max_entries = config.not_found.max_entries;
    match &config.not_found.persist_path {
        Some(path) => NotFoundLog::open(path, max_entries),
        None => NotFoundLog::new(None, max_entries),
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "fallback".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}
