//! Error presentation.
//!
//! Every failure the caller can see, whatever its origin, is rendered as the
//! same JSON envelope with transport status 200. Callers tell success from
//! failure by the body, never by the status line.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::forward::ForwardError;

/// Message returned for faults trapped by the fault boundary.
pub const INTERNAL_ERROR: &str = "err:internal_error";

/// `{"success": false, "err": "<message>"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub err: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            err: message.into(),
        }
    }

    /// Fixed, non-leaking envelope for unexpected faults.
    pub fn internal() -> Self {
        Self::new(INTERNAL_ERROR)
    }
}

impl From<&ForwardError> for ErrorEnvelope {
    fn from(err: &ForwardError) -> Self {
        Self::new(err.to_string())
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        ErrorEnvelope::from(&self).into_response()
    }
}
