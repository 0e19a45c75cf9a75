//! Cross-origin headers for every response.

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

/// Methods advertised in preflight responses.
const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::PUT,
    Method::PATCH,
    Method::POST,
    Method::DELETE,
];

/// Build the CORS layer. `"*"` becomes `Access-Control-Allow-Origin: *` on
/// every response; explicit origins are echoed back only when they match.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    let layer = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(ALLOWED_METHODS.to_vec())
        .allow_headers(AllowHeaders::mirror_request());

    match config.max_age_secs {
        Some(secs) => layer.max_age(Duration::from_secs(secs)),
        None => layer,
    }
}
