//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware pipeline)
//!     → request.rs (add request ID)
//!     → security layers (nonce, headers, rewrite)
//!     → inner application router
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{request_id_middleware, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
