//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay handler, forwarder, fault boundary produce:
//!     → logging.rs (structured tracing events, panic hook)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (tracing fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID is a field on every relay log line
//! - Metrics are cheap and no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
