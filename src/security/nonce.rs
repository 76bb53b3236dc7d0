//! Per-request script nonce issuance.
//!
//! # Responsibilities
//! - Generate one cryptographically random nonce per request
//! - Attach it to the request extensions for the header and rewrite layers
//!
//! # Design Decisions
//! - The nonce is an explicit request-scoped value, never process-global, so
//!   concurrent requests cannot observe each other's token
//! - Entropy failure is fatal for the request; a predictable fallback would
//!   defeat the nonce entirely

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

use crate::observability::metrics;

/// Bytes of entropy behind each nonce.
pub const NONCE_BYTES: usize = 16;

/// The OS entropy source could not supply random bytes.
#[derive(Debug, Error)]
#[error("entropy source unavailable: {0}")]
pub struct EntropyError(#[from] rand::Error);

/// An opaque, unguessable token, unique per request.
///
/// Issued at most once per request by [`nonce_middleware`]; downstream layers
/// read clones of the same value out of the request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptNonce(String);

impl ScriptNonce {
    /// Issue a fresh nonce from the OS CSPRNG.
    pub fn issue() -> Result<Self, EntropyError> {
        let mut bytes = [0u8; NONCE_BYTES];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(Self(STANDARD.encode(bytes)))
    }

    /// The text-encoded nonce value.
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Middleware that issues the request's nonce.
///
/// Must be the outermost layer of the security pipeline so the header and
/// rewrite layers find the nonce in the request extensions.
pub async fn nonce_middleware(mut request: Request, next: Next) -> Response {
    let nonce = match ScriptNonce::issue() {
        Ok(nonce) => nonce,
        Err(e) => {
            tracing::error!(error = %e, "Failed to issue script nonce");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Nonce generation failed")
                .into_response();
        }
    };

    metrics::record_nonce_issued();
    request.extensions_mut().insert(nonce);
    next.run(request).await
}
