//! Content-Security-Policy composition.
//!
//! Builds the single CSP header value from the validated directive
//! configuration plus the per-request nonce. Composition is a pure function:
//! identical config and nonce always produce a byte-identical policy string.

use crate::config::schema::CspConfig;

/// Directives that receive the per-request `'nonce-...'` source.
const NONCE_BEARING_DIRECTIVES: &[&str] = &["script-src", "script-src-elem"];

/// One directive name with its ordered, duplicate-free source list.
#[derive(Debug, Clone)]
pub struct SourceList {
    name: String,
    sources: Vec<String>,
}

impl SourceList {
    /// Build from config, dropping duplicate sources while preserving the
    /// author-specified order.
    fn from_config(name: &str, sources: &[String]) -> Self {
        let mut deduped: Vec<String> = Vec::with_capacity(sources.len());
        for source in sources {
            if deduped.iter().any(|s| s == source) {
                tracing::debug!(directive = name, source = %source, "Dropping duplicate CSP source");
                continue;
            }
            deduped.push(source.clone());
        }
        Self {
            name: name.to_string(),
            sources: deduped,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}

/// A validated CSP, ready for per-request composition.
#[derive(Debug, Clone)]
pub struct CspPolicy {
    directives: Vec<SourceList>,
    upgrade_insecure_requests: bool,
    report_uri: Option<String>,
}

impl CspPolicy {
    /// Build the policy from validated configuration.
    pub fn from_config(csp: &CspConfig) -> Self {
        let directives = csp
            .directives
            .iter()
            .map(|d| SourceList::from_config(&d.name, &d.sources))
            .collect();

        Self {
            directives,
            upgrade_insecure_requests: csp.upgrade_insecure_requests,
            report_uri: csp.report_uri.clone(),
        }
    }

    /// The directives in composition order.
    pub fn directives(&self) -> &[SourceList] {
        &self.directives
    }

    /// Compose the complete policy string for one request.
    ///
    /// Every nonce-bearing directive receives the same `nonce` value, so the
    /// attribute injected into the body always matches the header the browser
    /// checks it against.
    pub fn compose(&self, nonce: &str) -> String {
        let mut parts = Vec::with_capacity(self.directives.len() + 2);

        for list in &self.directives {
            let mut value = String::with_capacity(64);
            value.push_str(list.name());
            for source in list.sources() {
                value.push(' ');
                value.push_str(source);
            }
            if NONCE_BEARING_DIRECTIVES.contains(&list.name()) {
                value.push_str(" 'nonce-");
                value.push_str(nonce);
                value.push('\'');
            }
            parts.push(value);
        }

        if self.upgrade_insecure_requests {
            parts.push("upgrade-insecure-requests".to_string());
        }

        if let Some(uri) = &self.report_uri {
            parts.push(format!("report-uri {}", uri));
        }

        parts.join("; ")
    }
}
