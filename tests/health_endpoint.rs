//! End-to-end tests for `/health-check`.

use serde_json::Value;

mod common;

#[tokio::test]
async fn test_basic_check_is_plain_ok() {
    let root = tempfile::tempdir().unwrap();
    let server = common::spawn_server(common::isolated_config(root.path())).await;

    for path in ["/health-check", "/health-check?full=0", "/health-check.php", "/health-check?full=maybe"] {
        let res = common::client().get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), 200, "{path}");
        assert!(res.headers()["content-type"].to_str().unwrap().starts_with("text/plain"));
        assert_eq!(res.headers()["cache-control"], "no-cache, no-store, must-revalidate");
        assert_eq!(res.headers()["pragma"], "no-cache");
        assert_eq!(res.headers()["expires"], "0");
        assert!(res.headers().get("x-health-status").is_none());
        assert_eq!(res.text().await.unwrap(), "OK");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_full_check_database_down_is_degraded() {
    let root = tempfile::tempdir().unwrap();
    let server = common::spawn_server(common::isolated_config(root.path())).await;

    let res = common::client()
        .get(server.url("/health-check?full=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.headers()["x-health-status"], "degraded");

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["database"], "error");
    assert_eq!(body["services"]["cache_a"], "disconnected");
    assert_eq!(body["services"]["cache_b"], "disconnected");
    assert!(body["timestamp"].is_string());
    assert!(body["runtime_version"].as_str().unwrap().starts_with("turbo-health/"));
    assert!(body["disk"]["used_percent"].is_u64());
    assert!(body["memory"]["used_mb"].is_number());
    assert!(body["details"]["database"]["error"].is_string());

    server.stop().await;
}

#[cfg(feature = "memcached")]
#[tokio::test]
async fn test_cache_failure_does_not_degrade() {
    let root = tempfile::tempdir().unwrap();
    let mut config = common::isolated_config(root.path());
    config.database.enabled = false;
    config.memcached.enabled = true;
    config.memcached.host = "127.0.0.1".to_string();
    config.memcached.port = common::start_mock_memcached().await;
    config.redis.enabled = true;
    config.redis.host = "127.0.0.1".to_string();
    config.redis.port = common::closed_port().await;
    let server = common::spawn_server(config).await;

    let body: Value = common::client()
        .get(server.url("/health-check?full=true"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["cache_b"], "connected");
    assert_eq!(body["details"]["cache_b"]["version"], "1.6.21");
    assert_ne!(body["services"]["cache_a"], "connected");

    server.stop().await;
}

#[cfg(not(feature = "memcached"))]
#[tokio::test]
async fn test_missing_memcached_client_reports_extension_missing() {
    let root = tempfile::tempdir().unwrap();
    let mut config = common::isolated_config(root.path());
    config.database.enabled = false;
    config.memcached.enabled = true;
    config.memcached.host = "127.0.0.1".to_string();
    config.memcached.port = common::start_mock_memcached().await;
    let server = common::spawn_server(config).await;

    let body: Value = common::client()
        .get(server.url("/health-check?full=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["cache_b"], "extension_missing");
    assert_eq!(body["services"]["cache_a"], "disconnected");

    server.stop().await;
}

#[cfg(not(feature = "redis"))]
#[tokio::test]
async fn test_missing_redis_client_reports_extension_missing() {
    let root = tempfile::tempdir().unwrap();
    let mut config = common::isolated_config(root.path());
    config.database.enabled = false;
    config.redis.enabled = true;
    config.redis.host = "127.0.0.1".to_string();
    config.redis.port = common::closed_port().await;
    let server = common::spawn_server(config).await;

    let body: Value = common::client()
        .get(server.url("/health-check?full=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["cache_a"], "extension_missing");

    server.stop().await;
}

#[tokio::test]
async fn test_repeated_full_checks_agree() {
    let root = tempfile::tempdir().unwrap();
    let server = common::spawn_server(common::isolated_config(root.path())).await;
    let client = common::client();

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let body: Value = client
            .get(server.url("/health-check?full=1"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        statuses.push(body["status"].clone());
    }
    assert!(statuses.iter().all(|s| s == "degraded"));

    server.stop().await;
}

#[tokio::test]
async fn test_security_and_request_id_headers() {
    let root = tempfile::tempdir().unwrap();
    let server = common::spawn_server(common::isolated_config(root.path())).await;

    let res = common::client().get(server.url("/health-check")).send().await.unwrap();
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert_eq!(res.headers()["x-frame-options"], "SAMEORIGIN");
    assert_eq!(res.headers()["x-xss-protection"], "1; mode=block");
    assert!(!res.headers()["x-request-id"].is_empty());

    let res = common::client()
        .get(server.url("/health-check"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");

    server.stop().await;
}
