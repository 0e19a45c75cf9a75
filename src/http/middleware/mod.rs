//! Tower layers wrapped around the relay router.
//!
//! Order, outermost first: CORS → request ID → trace → fault boundary →
//! handler. CORS sits outside the fault boundary so that even a trapped panic
//! leaves with the cross-origin headers.

pub mod cors;
pub mod fault;

pub use cors::cors_layer;
pub use fault::fault_boundary;
