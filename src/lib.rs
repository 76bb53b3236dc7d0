//! Security Response-Header Gateway
//!
//! Wraps an Axum application with a nonce-consistent security pipeline:
//! per-request script nonces, CSP/HSTS/Permissions-Policy/Referrer-Policy
//! headers, and nonce injection into rendered HTML.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────┐
//!                  │                  GATEWAY                      │
//!   Request        │  ┌────────┐   ┌────────┐   ┌──────────────┐  │
//!   ───────────────┼─▶│ nonce  │──▶│ header │──▶│    inner     │  │
//!                  │  │ issuer │   │composer│   │  application │  │
//!                  │  └────────┘   └────────┘   └──────┬───────┘  │
//!                  │                                   │          │
//!   Response       │              ┌─────────┐          │          │
//!   ◀──────────────┼──────────────│ rewrite │◀─────────┘          │
//!                  │              │ (nonce) │                     │
//!                  │              └─────────┘                     │
//!                  │  config / lifecycle / observability          │
//!                  └──────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod security;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::{HeaderPlan, ScriptNonce};
