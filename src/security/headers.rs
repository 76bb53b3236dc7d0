//! Security response header composition.
//!
//! # Responsibilities
//! - Precompute the token-independent headers at startup (HSTS,
//!   Permissions-Policy, Referrer-Policy)
//! - Compose the full header set per request, interpolating the nonce into
//!   the CSP value
//! - Apply the set to outgoing responses via middleware
//!
//! # Design Decisions
//! - Report-only is the default; enforcement is a single config switch
//!   (`csp.enforce`), decided at startup, never per request
//! - Composition is pure; anything that could make it fail is rejected by
//!   config validation before the server starts

use axum::{
    extract::{Request, State},
    http::{
        header::{self, InvalidHeaderValue},
        HeaderName, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::config::schema::{GatewayConfig, HstsConfig, PermissionsPolicyConfig};
use crate::http::server::AppState;
use crate::security::nonce::ScriptNonce;
use crate::security::policy::CspPolicy;

/// Ordered set of response headers for one request.
pub type HeaderSet = Vec<(HeaderName, HeaderValue)>;

/// A composed header value was not legal on the wire.
///
/// Config validation makes this unreachable for any config the loader
/// accepts; it exists so composition propagates instead of panicking.
#[derive(Debug, Error)]
#[error("invalid value for header {name}: {source}")]
pub struct HeaderComposeError {
    name: &'static str,
    #[source]
    source: InvalidHeaderValue,
}

/// Precomputed header state shared across requests.
#[derive(Debug, Clone)]
pub struct HeaderPlan {
    csp_header: HeaderName,
    policy: CspPolicy,
    static_headers: HeaderSet,
}

impl HeaderPlan {
    /// Build the plan from validated configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, HeaderComposeError> {
        let csp_header = if config.csp.enforce {
            header::CONTENT_SECURITY_POLICY
        } else {
            header::CONTENT_SECURITY_POLICY_REPORT_ONLY
        };

        let mut static_headers = HeaderSet::new();

        if config.hsts.enabled {
            static_headers.push((
                header::STRICT_TRANSPORT_SECURITY,
                parse_value("strict-transport-security", &hsts_value(&config.hsts))?,
            ));
        }

        if !config.permissions_policy.features.is_empty() {
            static_headers.push((
                HeaderName::from_static("permissions-policy"),
                parse_value(
                    "permissions-policy",
                    &permissions_policy_value(&config.permissions_policy),
                )?,
            ));
        }

        static_headers.push((
            header::REFERRER_POLICY,
            parse_value("referrer-policy", &config.referrer_policy)?,
        ));

        Ok(Self {
            csp_header,
            policy: CspPolicy::from_config(&config.csp),
            static_headers,
        })
    }

    /// The header name the CSP is emitted under.
    pub fn csp_header(&self) -> &HeaderName {
        &self.csp_header
    }

    /// The policy this plan composes.
    pub fn policy(&self) -> &CspPolicy {
        &self.policy
    }

    /// Compose the complete header set for one request.
    pub fn compose(&self, nonce: &str) -> Result<HeaderSet, HeaderComposeError> {
        let csp = self.policy.compose(nonce);
        let mut headers = HeaderSet::with_capacity(self.static_headers.len() + 1);
        headers.push((
            self.csp_header.clone(),
            parse_value("content-security-policy", &csp)?,
        ));
        headers.extend(self.static_headers.iter().cloned());
        Ok(headers)
    }
}

fn parse_value(name: &'static str, value: &str) -> Result<HeaderValue, HeaderComposeError> {
    HeaderValue::from_str(value).map_err(|source| HeaderComposeError { name, source })
}

/// Strict-Transport-Security value, e.g. "max-age=63072000; includeSubDomains".
fn hsts_value(hsts: &HstsConfig) -> String {
    let mut value = format!("max-age={}", hsts.max_age_secs);
    if hsts.include_subdomains {
        value.push_str("; includeSubDomains");
    }
    if hsts.preload {
        value.push_str("; preload");
    }
    value
}

/// Permissions-Policy value, e.g. "camera=(), fullscreen=(self)".
fn permissions_policy_value(pp: &PermissionsPolicyConfig) -> String {
    pp.features
        .iter()
        .map(|(feature, allow)| format!("{}=({})", feature, allow.join(" ")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Middleware that applies the composed security headers to every response.
///
/// Expects the nonce issued by the outer layer; a missing nonce means the
/// pipeline was assembled in the wrong order and is treated as a server error
/// rather than emitting a policy the body rewrite cannot match.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(nonce) = request.extensions().get::<ScriptNonce>().cloned() else {
        tracing::error!("Script nonce missing from request extensions; header layer misordered");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let headers = match state.plan.compose(nonce.value()) {
        Ok(headers) => headers,
        Err(e) => {
            tracing::error!(error = %e, "Failed to compose security headers");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = next.run(request).await;
    for (name, value) in headers {
        response.headers_mut().insert(name, value);
    }
    response
}
