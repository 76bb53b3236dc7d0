//! Request identification.
//!
//! # Responsibilities
//! - Ensure every request carries an x-request-id (UUID v4 when absent)
//! - Echo the ID on the response for client-side correlation
//! - Record the per-request counter metric

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::observability::metrics;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Middleware that assigns or propagates the request ID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = match request.headers().get(&X_REQUEST_ID) {
        Some(existing) if !existing.is_empty() => existing.clone(),
        _ => HeaderValue::from_str(&Uuid::new_v4().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("unknown")),
    };
    request.headers_mut().insert(X_REQUEST_ID, id.clone());

    let method = request.method().to_string();
    let mut response = next.run(request).await;

    metrics::record_request(&method, response.status().as_u16());
    response.headers_mut().insert(X_REQUEST_ID, id);
    response
}
