//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware/ (CORS, request ID, trace, fault boundary)
//!     → request.rs (request ID, `?url=` extraction)
//!     → forward:: (outbound request)
//!     → response.rs (framing, ranges) | error.rs (JSON envelope)
//!     → Send to client
//! ```

pub mod error;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use error::{ErrorEnvelope, INTERNAL_ERROR};
pub use request::{MakeRelayRequestId, RelayQuery, X_REQUEST_ID};
pub use response::RelayedContent;
pub use server::{AppState, HttpServer, ServerError};
