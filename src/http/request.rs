//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every inbound request
//! - Extract the relay target from the `url` query parameter
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A caller-supplied `x-request-id` is kept, not replaced
//! - The target is taken verbatim; validation belongs to the forwarder

use axum::http::{HeaderMap, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRelayRequestId;

impl MakeRequestId for MakeRelayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Query string of a relay request: `?url=<percent-encoded target>`.
#[derive(Debug, Default)]
pub struct RelayQuery {
    pub url: String,
}

impl RelayQuery {
    /// Parse the relay query from a request URI.
    ///
    /// The first `url` pair wins; later ones are ignored. A missing `url`
    /// yields an empty target, which the forwarder rejects like any other
    /// bad URL.
    pub fn from_uri(uri: &Uri) -> Self {
        let url = uri
            .query()
            .and_then(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .find(|(key, _)| key == "url")
                    .map(|(_, value)| value.into_owned())
            })
            .unwrap_or_default();
        Self { url }
    }
}
