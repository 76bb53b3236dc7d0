//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject header values that would be illegal on the wire
//! - Enforce CSP structural invariants (unique directives, non-empty lists)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Runs once at startup; the process refuses to serve with an invalid
//!   security-header configuration rather than silently omitting headers

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// Referrer-Policy values the gateway will emit.
const REFERRER_POLICIES: &[&str] = &[
    "no-referrer",
    "no-referrer-when-downgrade",
    "origin",
    "origin-when-cross-origin",
    "same-origin",
    "strict-origin",
    "strict-origin-when-cross-origin",
    "unsafe-url",
];

/// A single semantic configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duplicate CSP directive: {0}")]
    DuplicateDirective(String),

    #[error("CSP directive '{0}' has an empty source list")]
    EmptySourceList(String),

    #[error("CSP configuration is missing the 'script-src' directive")]
    MissingScriptSrc,

    #[error("invalid CSP directive name: {0:?}")]
    InvalidDirectiveName(String),

    #[error("illegal character in {context}: {value:?}")]
    IllegalValue {
        context: &'static str,
        value: String,
    },

    #[error("unknown referrer policy: {0:?}")]
    UnknownReferrerPolicy(String),

    #[error("invalid report_uri: {0}")]
    InvalidReportUri(String),

    #[error("hsts.max_age_secs must be greater than zero when HSTS is enabled")]
    ZeroHstsMaxAge,

    #[error("rewrite.max_body_bytes must be greater than zero when rewriting is enabled")]
    ZeroRewriteBuffer,

    #[error("observability.metrics_address is not a valid socket address: {0:?}")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every semantic error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_csp(config, &mut errors);

    if !REFERRER_POLICIES.contains(&config.referrer_policy.as_str()) {
        errors.push(ValidationError::UnknownReferrerPolicy(
            config.referrer_policy.clone(),
        ));
    }

    for (feature, allow) in &config.permissions_policy.features {
        if !is_token(feature) {
            errors.push(ValidationError::IllegalValue {
                context: "permissions_policy feature name",
                value: feature.clone(),
            });
        }
        for entry in allow {
            if !is_header_safe(entry) {
                errors.push(ValidationError::IllegalValue {
                    context: "permissions_policy allow-list entry",
                    value: entry.clone(),
                });
            }
        }
    }

    if config.hsts.enabled && config.hsts.max_age_secs == 0 {
        errors.push(ValidationError::ZeroHstsMaxAge);
    }

    if config.rewrite.enabled && config.rewrite.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroRewriteBuffer);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_csp(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    let mut has_script_src = false;

    for directive in &config.csp.directives {
        if !is_token(&directive.name) {
            errors.push(ValidationError::InvalidDirectiveName(
                directive.name.clone(),
            ));
        }
        if !seen.insert(directive.name.as_str()) {
            errors.push(ValidationError::DuplicateDirective(directive.name.clone()));
        }
        if directive.sources.is_empty() {
            errors.push(ValidationError::EmptySourceList(directive.name.clone()));
        }
        for source in &directive.sources {
            // A source containing whitespace or ';' would change the meaning
            // of the joined policy string.
            if source.is_empty()
                || !is_header_safe(source)
                || source.contains(|c: char| c.is_ascii_whitespace() || c == ';')
            {
                errors.push(ValidationError::IllegalValue {
                    context: "CSP source",
                    value: source.clone(),
                });
            }
        }
        if directive.name == "script-src" {
            has_script_src = true;
        }
    }

    if !has_script_src {
        errors.push(ValidationError::MissingScriptSrc);
    }

    if let Some(uri) = &config.csp.report_uri {
        if url::Url::parse(uri).is_err() {
            errors.push(ValidationError::InvalidReportUri(uri.clone()));
        }
    }
}

/// Printable ASCII with no control characters: safe inside a header value.
fn is_header_safe(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii() && !c.is_ascii_control())
}

/// Lowercase alphanumeric token with hyphens, as used by directive and
/// feature names.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
