//! Fault boundary around dispatched calls.
//!
//! A panic inside a handler is caught here, logged, counted, and turned into
//! the fixed internal-error envelope. The connection and the server survive.
//! The process panic hook (see `observability::logging`) has already logged
//! the location and backtrace by the time this runs.

use std::any::Any;

use axum::body::Body;
use axum::http::Response;
use axum::response::IntoResponse;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

use crate::http::error::ErrorEnvelope;
use crate::observability::metrics;

/// Converts a caught panic into the internal-error envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalErrorOnPanic;

impl ResponseForPanic for InternalErrorOnPanic {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Self::ResponseBody> {
        tracing::error!(panic = %panic_message(&*err), "Handler panicked, returning internal error");
        metrics::record_fault();
        ErrorEnvelope::internal().into_response()
    }
}

/// Layer installing the fault boundary.
pub fn fault_boundary() -> CatchPanicLayer<InternalErrorOnPanic> {
    CatchPanicLayer::custom(InternalErrorOnPanic)
}

fn panic_message<'a>(payload: &'a (dyn Any + Send + 'static)) -> &'a str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
