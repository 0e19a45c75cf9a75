//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults, or --config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CLI overrides (--host, --port)
//!     → RelayConfig (validated, immutable)
//!     → handed to HttpServer at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults, so running with no file is the common case
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CorsConfig, ForwardConfig, ListenerConfig, ObservabilityConfig, RelayConfig, SecurityConfig,
    TimeoutConfig, DEFAULT_PORT,
};
pub use validation::{validate_config, ValidationError};
