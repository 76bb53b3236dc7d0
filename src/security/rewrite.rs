//! Nonce injection into rendered HTML.
//!
//! # Responsibilities
//! - Buffer HTML response bodies and insert `nonce="..."` into every opening
//!   `<script>` tag that does not already declare one
//! - Leave every other byte of the body untouched
//!
//! # Design Decisions
//! - Scanner over the tag stream instead of a regular expression: comments,
//!   quoted attribute values, and inline script content are all places a
//!   naive text match would corrupt
//! - Fail open: if the markup cannot be processed safely, the original body
//!   is emitted and the occurrence is logged and counted
//! - Only `text/html` responses are considered; everything else streams
//!   through unbuffered

use std::borrow::Cow;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::nonce::ScriptNonce;

/// The markup could not be rewritten safely.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("unterminated tag at byte offset {offset}")]
    UnterminatedTag { offset: usize },
}

/// Insert `nonce="<nonce>"` into every opening `<script>` tag lacking a
/// `nonce` attribute.
///
/// Idempotent: tags that already declare a nonce (including ones inserted by
/// a previous pass) are left untouched. Returns `Cow::Borrowed` when nothing
/// needed rewriting.
pub fn inject_nonce<'a>(html: &'a str, nonce: &str) -> Result<Cow<'a, str>, RewriteError> {
    let bytes = html.as_bytes();
    let mut out: Option<String> = None;
    // Start of the input span not yet copied to `out`.
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }

        // Comments may contain the literal text "<script"; skip them whole.
        if bytes[i..].starts_with(b"<!--") {
            match find_ignore_case(bytes, b"-->", i + 4) {
                Some(end) => {
                    i = end + 3;
                    continue;
                }
                // Unterminated comment swallows the rest of the document.
                None => break,
            }
        }

        if starts_with_ignore_case(&bytes[i..], b"<script")
            && bytes.get(i + 7).is_some_and(|&b| is_tag_boundary(b))
        {
            let tag_end = find_tag_end(bytes, i + 7)
                .ok_or(RewriteError::UnterminatedTag { offset: i })?;

            if !has_nonce_attr(&html[i + 7..tag_end]) {
                let buf = out.get_or_insert_with(|| String::with_capacity(html.len() + 64));
                buf.push_str(&html[copied..i + 7]);
                buf.push_str(" nonce=\"");
                buf.push_str(nonce);
                buf.push('"');
                copied = i + 7;
            }

            // Skip the element's text content so a "<script" substring inside
            // inline JS or JSON is not mistaken for a new tag.
            i = match find_ignore_case(bytes, b"</script", tag_end + 1) {
                Some(close) => close + 8,
                None => tag_end + 1,
            };
            continue;
        }

        // Any other tag: skip to its closing '>' so a "<script" substring
        // inside one of its attribute values is not mistaken for a tag.
        if bytes
            .get(i + 1)
            .is_some_and(|&b| b.is_ascii_alphabetic() || b == b'/' || b == b'!' || b == b'?')
        {
            match find_tag_end(bytes, i + 1) {
                Some(end) => {
                    i = end + 1;
                    continue;
                }
                // No '>' remains, so no further tag can complete.
                None => break,
            }
        }

        i += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&html[copied..]);
            Ok(Cow::Owned(buf))
        }
        None => Ok(Cow::Borrowed(html)),
    }
}

fn is_tag_boundary(b: u8) -> bool {
    b == b'>' || b == b'/' || b.is_ascii_whitespace()
}

fn starts_with_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}

fn find_ignore_case(bytes: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
        .map(|pos| pos + from)
}

/// Locate the tag-closing '>', skipping over quoted attribute values.
fn find_tag_end(bytes: &[u8], mut i: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(i),
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Whether the attribute text of an opening tag declares a `nonce` attribute.
///
/// Tokenizes attributes properly so `data-nonce` or a value like
/// `src="nonce"` do not count as one.
fn has_nonce_attr(attrs: &str) -> bool {
    let bytes = attrs.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && bytes[i] != b'='
            && bytes[i] != b'/'
        {
            i += 1;
        }
        if i == start {
            i += 1;
            continue;
        }
        let name = &attrs[start..i];

        // Consume an optional "= value" so values never look like names.
        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j < bytes.len() && bytes[j] == b'=' {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && (bytes[j] == b'"' || bytes[j] == b'\'') {
                let q = bytes[j];
                j += 1;
                while j < bytes.len() && bytes[j] != q {
                    j += 1;
                }
                if j < bytes.len() {
                    j += 1;
                }
            } else {
                while j < bytes.len() && !bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
            }
        }

        if name.eq_ignore_ascii_case("nonce") {
            return true;
        }
        i = j;
    }

    false
}

/// Middleware that rewrites buffered HTML responses.
///
/// Consumes the nonce issued earlier in the same request; sets no headers and
/// issues no tokens itself.
pub async fn rewrite_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let nonce = request.extensions().get::<ScriptNonce>().cloned();
    let response = next.run(request).await;

    if !state.config.rewrite.enabled {
        return response;
    }
    let Some(nonce) = nonce else {
        tracing::warn!("Script nonce missing from request extensions; skipping HTML rewrite");
        return response;
    };
    if !is_html(&response) {
        return response;
    }

    let max_bytes = state.config.rewrite.max_body_bytes;
    if declared_length(&response).is_some_and(|len| len > max_bytes) {
        tracing::warn!(
            limit = max_bytes,
            "HTML response exceeds rewrite buffer limit; passing through unmodified"
        );
        metrics::record_rewrite_failure("body_too_large");
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, max_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to buffer HTML response body");
            metrics::record_rewrite_failure("buffering");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = match std::str::from_utf8(&bytes) {
        Ok(html) => html,
        Err(_) => {
            tracing::warn!("HTML response body is not valid UTF-8; skipping rewrite");
            metrics::record_rewrite_failure("not_utf8");
            return Response::from_parts(parts, Body::from(bytes));
        }
    };

    let rewritten = match inject_nonce(html, nonce.value()) {
        Ok(Cow::Owned(rewritten)) => Some(rewritten),
        Ok(Cow::Borrowed(_)) => None,
        Err(e) => {
            tracing::warn!(error = %e, "HTML rewrite failed; emitting original body");
            metrics::record_rewrite_failure("malformed_markup");
            None
        }
    };

    match rewritten {
        Some(rewritten) => {
            parts
                .headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from(rewritten.len()));
            Response::from_parts(parts, Body::from(rewritten))
        }
        None => Response::from_parts(parts, Body::from(bytes)),
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"))
}

fn declared_length(response: &Response) -> Option<usize> {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
