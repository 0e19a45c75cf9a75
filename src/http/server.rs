//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the relay handler at `/`
//! - Wire up middleware (CORS, request ID, tracing, fault boundary)
//! - Bind server to listener
//! - Dispatch relay requests to the forwarder
//! - Observability (metrics, request IDs)

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::{any, get, MethodRouter},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::forward::Forwarder;
use crate::http::error::ErrorEnvelope;
use crate::http::middleware::{cors_layer, fault_boundary};
use crate::http::request::{request_id, MakeRelayRequestId, RelayQuery};
use crate::http::response::RelayedContent;
use crate::lifecycle::wait_for_shutdown;
use crate::observability::metrics;

/// Errors building the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build outbound HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        // One outbound client for the lifetime of the process
        let forwarder = Forwarder::from_config(&config)?;
        let state = AppState { forwarder };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(config: &RelayConfig, state: AppState) -> Router {
        // `any` already owns the method fallback
        let relay: MethodRouter<AppState> = if config.forward.all_methods {
            any(relay_handler)
        } else {
            get(relay_handler)
                .post(relay_handler)
                .fallback(method_not_allowed)
        };

        let routes = Router::new()
            .route("/", relay)
            .fallback(not_found)
            .with_state(state);
        with_layers(routes, config)
    }

    /// A clone of the fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until an
    /// OS signal or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            preserve_content_type = self.config.forward.preserve_content_type,
            block_private_targets = self.config.security.block_private_targets,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Wrap `routes` in the middleware stack, outermost first: CORS, request ID,
/// trace, fault boundary.
fn with_layers(routes: Router, config: &RelayConfig) -> Router {
    routes
        .layer(fault_boundary())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRelayRequestId))
        .layer(cors_layer(&config.cors))
}

/// Relay handler: forwards the request to `?url=` and serves the result.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers).to_string();
    let method = parts.method.as_str();

    let target = RelayQuery::from_uri(&parts.uri).url;

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        target = %target,
        "Relaying request"
    );

    match state.forwarder.forward(method, &target, body).await {
        Ok(relayed) => {
            let status = relayed.upstream_status;
            tracing::info!(
                request_id = %request_id,
                method = %method,
                target = %target,
                upstream_status = status.as_u16(),
                bytes = relayed.body.len(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Relayed"
            );
            metrics::record_upstream_status(status.as_u16());
            metrics::record_request(method, "ok", start_time);
            RelayedContent::from(relayed).serve(&parts.method, &parts.headers)
        }
        Err(err) => {
            tracing::warn!(
                request_id = %request_id,
                method = %method,
                target = %target,
                kind = err.kind(),
                error = %err,
                "Relay failed"
            );
            metrics::record_request(method, err.kind(), start_time);
            err.into_response()
        }
    }
}

async fn not_found() -> ErrorEnvelope {
    ErrorEnvelope::new("Not Found")
}

async fn method_not_allowed() -> ErrorEnvelope {
    ErrorEnvelope::new("Method Not Allowed")
}
