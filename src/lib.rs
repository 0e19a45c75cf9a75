//! CORS relay library.
//!
//! Accepts `GET|POST /?url=<target>`, replays the request against the target
//! and returns the upstream body with permissive cross-origin headers, so
//! browser code can reach endpoints that do not grant cross-origin access.

// Core subsystems
pub mod config;
pub mod forward;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::RelayConfig;
pub use forward::{ForwardError, Forwarder};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
