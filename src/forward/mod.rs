//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! relay handler (method, ?url=, body)
//!     → forwarder.rs (parse method & URL, apply target policy, buffer body)
//!     → client.rs (shared reqwest client, connect + request timeouts)
//!     → upstream
//!     → forwarder.rs (buffer upstream body, stamp relay time)
//!     → Relayed | ForwardError (error.rs)
//! ```

pub mod client;
pub mod error;
pub mod forwarder;

pub use error::ForwardError;
pub use forwarder::{Forwarder, Relayed};
