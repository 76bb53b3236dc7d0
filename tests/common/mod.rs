//! Shared utilities for integration testing.

use std::net::SocketAddr;

use axum::{response::Html, routing::get, Json, Router};
use tokio::net::TcpListener;

use shieldgate::{GatewayConfig, HttpServer, Shutdown};

/// Inner application page with one inline script and no nonce.
pub const PAGE: &str = concat!(
    "<!DOCTYPE html><html><body>",
    "<h1>test page</h1>",
    "<script>console.log('inline');</script>",
    "</body></html>"
);

/// Build the inner application the gateway wraps in tests.
pub fn test_app() -> Router {
    Router::new()
        .route("/", get(|| async { Html(PAGE) }))
        .route("/api", get(|| async { Json(serde_json::json!({ "ok": true })) }))
}

/// Start a gateway around the test app on an ephemeral port.
#[allow(dead_code)]
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config, test_app()).expect("valid gateway config");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

/// Pull the token out of a composed CSP value's first nonce source.
#[allow(dead_code)]
pub fn extract_nonce(csp: &str) -> Option<String> {
    let start = csp.find("'nonce-")? + "'nonce-".len();
    let rest = &csp[start..];
    let end = rest.find('\'')?;
    Some(rest[..end].to_string())
}
