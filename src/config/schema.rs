//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration for the security-header gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS, timeout).
    pub listener: ListenerConfig,

    /// Content-Security-Policy composition.
    pub csp: CspConfig,

    /// Strict-Transport-Security settings.
    pub hsts: HstsConfig,

    /// Permissions-Policy feature allow-lists.
    pub permissions_policy: PermissionsPolicyConfig,

    /// Referrer-Policy value (e.g., "strict-origin-when-cross-origin").
    pub referrer_policy: String,

    /// HTML nonce-rewrite settings.
    pub rewrite: RewriteConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            csp: CspConfig::default(),
            hsts: HstsConfig::default(),
            permissions_policy: PermissionsPolicyConfig::default(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
            rewrite: RewriteConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            request_timeout_secs: 30,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// One CSP directive and its ordered source list.
///
/// Directives are configured as an array of tables rather than a map so the
/// author-specified order survives deserialization.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectiveConfig {
    /// Directive name (e.g., "script-src").
    pub name: String,

    /// Ordered origins/keywords for the directive (e.g., `["'self'"]`).
    pub sources: Vec<String>,
}

impl DirectiveConfig {
    pub fn new(name: &str, sources: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Content-Security-Policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CspConfig {
    /// When false (the default), the policy is emitted under
    /// Content-Security-Policy-Report-Only. When true, under
    /// Content-Security-Policy.
    pub enforce: bool,

    /// Ordered directive list. Must contain a "script-src" entry.
    pub directives: Vec<DirectiveConfig>,

    /// Append the value-less "upgrade-insecure-requests" directive.
    pub upgrade_insecure_requests: bool,

    /// Optional violation report endpoint, appended as a "report-uri" directive.
    pub report_uri: Option<String>,
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            enforce: false,
            directives: vec![
                DirectiveConfig::new("default-src", &["'self'"]),
                DirectiveConfig::new("script-src", &["'self'"]),
                DirectiveConfig::new("script-src-elem", &["'self'"]),
                DirectiveConfig::new("style-src", &["'self'"]),
                DirectiveConfig::new("img-src", &["'self'", "data:"]),
                DirectiveConfig::new("font-src", &["'self'"]),
                DirectiveConfig::new("connect-src", &["'self'"]),
                DirectiveConfig::new("frame-src", &["'self'"]),
                DirectiveConfig::new("worker-src", &["'self'"]),
                DirectiveConfig::new("base-uri", &["'self'"]),
            ],
            upgrade_insecure_requests: true,
            report_uri: None,
        }
    }
}

/// Strict-Transport-Security configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HstsConfig {
    /// Emit the header at all.
    pub enabled: bool,

    /// max-age in seconds. Default is two years.
    pub max_age_secs: u64,

    /// Append "includeSubDomains".
    pub include_subdomains: bool,

    /// Append "preload".
    pub preload: bool,
}

impl Default for HstsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_secs: 63_072_000,
            include_subdomains: true,
            preload: false,
        }
    }
}

/// Permissions-Policy configuration.
///
/// Maps a browser feature name to its allow-list. An empty allow-list denies
/// the feature everywhere, which is the default for every listed feature.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PermissionsPolicyConfig {
    pub features: BTreeMap<String, Vec<String>>,
}

impl Default for PermissionsPolicyConfig {
    fn default() -> Self {
        let denied = [
            "accelerometer",
            "autoplay",
            "camera",
            "display-capture",
            "geolocation",
            "gyroscope",
            "magnetometer",
            "microphone",
            "midi",
            "payment",
            "usb",
        ];
        Self {
            features: denied
                .iter()
                .map(|f| (f.to_string(), Vec::new()))
                .collect(),
        }
    }
}

/// HTML nonce-rewrite configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Rewrite HTML responses at all.
    pub enabled: bool,

    /// Upper bound on the buffered response body. HTML responses declaring a
    /// larger Content-Length are passed through without rewriting.
    pub max_body_bytes: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Expose a Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Bind address for the metrics endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}
