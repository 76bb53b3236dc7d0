//! Security subsystem: the nonce-consistent header/content pipeline.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → nonce.rs (issue per-request script nonce)
//!     → headers.rs (compose CSP/HSTS/Permissions/Referrer headers)
//!     → inner application renders HTML
//!     → rewrite.rs (inject the same nonce into <script> tags)
//!     → Response to client
//! ```
//!
//! # Design Decisions
//! - One token per request, threaded through request extensions; the header
//!   and body layers always see the same value
//! - Headers are composed from validated config only; nothing at request time
//!   can change the policy besides the nonce
//! - Rewrite failures fail open (original body) so malformed markup degrades
//!   to a blocked script, never to corrupted output

pub mod headers;
pub mod nonce;
pub mod policy;
pub mod rewrite;

pub use headers::{HeaderPlan, HeaderSet};
pub use nonce::{EntropyError, ScriptNonce};
pub use policy::CspPolicy;
pub use rewrite::{inject_nonce, RewriteError};
