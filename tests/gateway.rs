//! End-to-end tests for the security pipeline.

use std::collections::HashSet;

use axum::body::Body;
use axum::http::Request;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;

use shieldgate::{GatewayConfig, HttpServer};

mod common;
use common::{extract_nonce, start_gateway, test_app, PAGE};

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn default_security_headers_are_present() {
    let (addr, _shutdown) = start_gateway(GatewayConfig::default()).await;

    let res = client()
        .get(format!("http://{}/", addr))
        .send()
        .await
        .expect("gateway unreachable");

    assert_eq!(res.status(), 200);
    let headers = res.headers();
    assert!(headers.contains_key("content-security-policy-report-only"));
    assert!(!headers.contains_key("content-security-policy"));
    assert_eq!(
        headers.get("strict-transport-security").unwrap(),
        "max-age=63072000; includeSubDomains"
    );
    assert!(headers.contains_key("permissions-policy"));
    assert_eq!(
        headers.get("referrer-policy").unwrap(),
        "strict-origin-when-cross-origin"
    );
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn header_and_body_share_one_token() {
    let (addr, _shutdown) = start_gateway(GatewayConfig::default()).await;

    let res = client()
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap();

    let csp = res
        .headers()
        .get("content-security-policy-report-only")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let nonce = extract_nonce(&csp).expect("CSP carries a nonce source");
    assert!(!nonce.is_empty());

    // Every nonce source in the policy carries the same token.
    let occurrences = csp.matches("'nonce-").count();
    assert!(occurrences >= 2, "script-src and script-src-elem both tagged");
    assert_eq!(occurrences, csp.matches(&format!("'nonce-{}'", nonce)).count());

    let body = res.text().await.unwrap();
    assert!(body.contains(&format!("<script nonce=\"{}\">", nonce)));
}

#[tokio::test]
async fn tokens_are_unique_across_requests() {
    let (addr, _shutdown) = start_gateway(GatewayConfig::default()).await;
    let client = client();

    let mut seen = HashSet::new();
    for _ in 0..32 {
        let res = client.get(format!("http://{}/", addr)).send().await.unwrap();
        let csp = res
            .headers()
            .get("content-security-policy-report-only")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        seen.insert(extract_nonce(&csp).unwrap());
    }

    assert_eq!(seen.len(), 32);
}

#[tokio::test]
async fn enforce_mode_switches_the_header_name() {
    let mut config = GatewayConfig::default();
    config.csp.enforce = true;
    let (addr, _shutdown) = start_gateway(config).await;

    let res = client()
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap();

    let headers = res.headers();
    assert!(!headers.contains_key("content-security-policy-report-only"));
    let csp = headers
        .get("content-security-policy")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(csp.starts_with("default-src 'self'"));
}

#[tokio::test]
async fn non_html_responses_are_not_rewritten() {
    let (addr, _shutdown) = start_gateway(GatewayConfig::default()).await;

    let res = client()
        .get(format!("http://{}/api", addr))
        .send()
        .await
        .unwrap();

    // Headers still apply to non-HTML responses; the body does not.
    assert!(res
        .headers()
        .contains_key("content-security-policy-report-only"));
    let body = res.text().await.unwrap();
    assert!(!body.contains("nonce"));
}

#[tokio::test]
async fn rewrite_can_be_disabled() {
    let mut config = GatewayConfig::default();
    config.rewrite.enabled = false;
    let (addr, _shutdown) = start_gateway(config).await;

    let res = client()
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap();

    assert!(res
        .headers()
        .contains_key("content-security-policy-report-only"));
    let body = res.text().await.unwrap();
    assert_eq!(body, PAGE);
}

#[tokio::test]
async fn malformed_html_fails_open_with_the_original_body() {
    // An unterminated script tag cannot be rewritten safely; the gateway
    // must emit the body untouched rather than corrupt it.
    const BROKEN: &str = "<body><p>page</p><script src=\"/app.js\"";
    let app = Router::new().route("/broken", get(|| async { Html(BROKEN) }));
    let server = HttpServer::new(GatewayConfig::default(), app).unwrap();

    let response = server
        .into_router()
        .oneshot(Request::builder().uri("/broken").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    // The header layer is unaffected by the rewrite falling back.
    assert!(response
        .headers()
        .contains_key("content-security-policy-report-only"));

    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    assert_eq!(&bytes[..], BROKEN.as_bytes());
}

#[tokio::test]
async fn pipeline_is_drivable_without_a_socket() {
    let server = HttpServer::new(GatewayConfig::default(), test_app()).unwrap();
    let router = server.into_router();

    let response = router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let csp = response
        .headers()
        .get("content-security-policy-report-only")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let nonce = extract_nonce(&csp).unwrap();

    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains(&format!("nonce=\"{}\"", nonce)));
}
