//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to the middleware pipeline
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart. A broken
//!   security-header config is a deploy-time problem, never a request-time one.
//! - All fields have defaults so a minimal (or absent) config file works
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::GatewayConfig;
pub use validation::{validate_config, ValidationError};
