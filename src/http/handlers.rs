//! Route handlers.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, RawQuery, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::diagnostics::{self, dashboard, info, pages};
use crate::health::HealthOutcome;
use crate::http::request::{client_ip, wants_full_report};
use crate::http::response::{html, no_cache, pretty_json, text, X_HEALTH_STATUS};
use crate::http::server::AppState;
use crate::not_found::HitKey;
use crate::probes::compiled_clients;

/// Where unknown URLs are sent after being logged.
pub const NOT_FOUND_PATH: &str = "/404";

/// `GET /health-check[?full=1]`.
pub async fn health_check(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let full = wants_full_report(query.as_deref());
    let response = match state.aggregator.check(full).await {
        HealthOutcome::PlainOk => text(StatusCode::OK, "OK"),
        HealthOutcome::Full(report) => {
            let mut response = pretty_json(StatusCode::OK, &report.to_json());
            response.headers_mut().insert(
                X_HEALTH_STATUS,
                HeaderValue::from_static(report.overall_status.as_str()),
            );
            response
        }
    };
    no_cache(response)
}

pub async fn welcome() -> Response {
    html(StatusCode::OK, pages::welcome_page())
}

pub async fn dashboard(State(state): State<AppState>) -> Response {
    let dashboard =
        dashboard::build_dashboard(&state.config, &state.aggregator, &state.not_found).await;
    pretty_json(StatusCode::OK, &dashboard)
}

pub async fn runtime_info(State(state): State<AppState>) -> Response {
    if state.config.is_production() {
        return text(StatusCode::FORBIDDEN, info::PRODUCTION_DENIED);
    }
    pretty_json(StatusCode::OK, &info::runtime_info(&state.config))
}

pub async fn extensions(State(state): State<AppState>) -> Response {
    if state.config.is_production() {
        return text(StatusCode::FORBIDDEN, info::PRODUCTION_DENIED);
    }
    pretty_json(StatusCode::OK, &compiled_clients())
}

pub async fn test_db(State(state): State<AppState>) -> Response {
    text(StatusCode::OK, diagnostics::test_database(&state.aggregator).await)
}

pub async fn not_found_page() -> Response {
    html(StatusCode::NOT_FOUND, pages::NOT_FOUND_PAGE)
}

/// Log an unmatched request, then redirect to the 404 page.
pub async fn log_not_found(State(state): State<AppState>, request: Request) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let headers = request.headers();
    let ip = client_ip(headers, peer);
    let referer = headers.get(header::REFERER).and_then(|v| v.to_str().ok());
    let uri = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    match state.not_found.record(HitKey::new(uri, referer, ip)) {
        Some(count) => tracing::debug!(uri = %uri, client_ip = %ip, count, "Not found"),
        None => tracing::debug!(uri = %uri, client_ip = %ip, "Not found, log full"),
    }

    (StatusCode::FOUND, [(header::LOCATION, NOT_FOUND_PATH)]).into_response()
}
