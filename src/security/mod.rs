//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Relay request:
//!     → target.rs (scheme allowlist, optional private-address refusal)
//!     → body size limit (applied by the forwarder while buffering)
//!     → outbound request
//! ```
//!
//! # Design Decisions
//! - Fail closed: a refused target never reaches the network
//! - No trust in client input; the target URL is always parsed first

pub mod target;

pub use target::{TargetPolicy, TargetViolation};
