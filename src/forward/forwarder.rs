//! The forwarding operation.
//!
//! # Responsibilities
//! - Turn (method, target URL, body) into exactly one outbound request
//! - Map every failure onto a [`ForwardError`] category
//! - Buffer the upstream body and stamp it with the forwarding time
//!
//! # Design Decisions
//! - No inbound headers are copied; the outbound request is built fresh
//! - Upstream status is recorded but never turned into an error
//! - Dropping the returned future cancels the outbound exchange

use std::time::SystemTime;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Method, StatusCode};
use url::Url;

use crate::config::RelayConfig;
use crate::forward::client::build_client;
use crate::forward::error::{describe, ForwardError};
use crate::security::TargetPolicy;

/// A successfully relayed upstream response.
#[derive(Debug, Clone)]
pub struct Relayed {
    /// Upstream body, read in full.
    pub body: Bytes,
    /// Upstream `Content-Type`, when it is being preserved.
    pub content_type: Option<HeaderValue>,
    /// Upstream status, kept for logging only.
    pub upstream_status: StatusCode,
    /// When the relay finished reading the upstream response.
    pub relayed_at: SystemTime,
}

/// Issues outbound requests on behalf of relay callers.
///
/// Holds no per-call state. Clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    policy: TargetPolicy,
    max_body_size: usize,
    preserve_content_type: bool,
}

impl Forwarder {
    /// Create a forwarder around an existing client.
    pub fn new(client: reqwest::Client, config: &RelayConfig) -> Self {
        Self {
            client,
            policy: TargetPolicy::from_config(&config.security),
            max_body_size: config.security.max_body_size,
            preserve_content_type: config.forward.preserve_content_type,
        }
    }

    /// Build the shared client from config and wrap it.
    pub fn from_config(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        let client = build_client(&config.timeouts, &config.forward)?;
        Ok(Self::new(client, config))
    }

    /// Replay `method` against `target_url` with `body`, returning the buffered
    /// upstream body.
    pub async fn forward(
        &self,
        method: &str,
        target_url: &str,
        body: Body,
    ) -> Result<Relayed, ForwardError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| ForwardError::RequestConstruction(format!("method {method:?}: {e}")))?;

        let url = Url::parse(target_url)
            .map_err(|e| ForwardError::RequestConstruction(format!("url {target_url:?}: {e}")))?;

        self.policy.check(&url).map_err(|violation| {
            if violation.is_policy() {
                ForwardError::TargetRejected(violation.to_string())
            } else {
                ForwardError::RequestConstruction(violation.to_string())
            }
        })?;

        let payload = axum::body::to_bytes(body, self.max_body_size)
            .await
            .map_err(|e| ForwardError::RequestConstruction(format!("request body: {}", describe(&e))))?;

        let mut builder = self.client.request(method.clone(), url);
        if !payload.is_empty() {
            builder = builder.body(payload);
        }
        let request = builder
            .build()
            .map_err(|e| ForwardError::RequestConstruction(describe(&e)))?;

        tracing::debug!(
            method = %method,
            target = %request.url(),
            body_len = request.body().and_then(|b| b.as_bytes()).map_or(0, |b| b.len()),
            "Issuing outbound request"
        );

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| ForwardError::Transport(describe(&e)))?;

        let upstream_status = response.status();
        let content_type = if self.preserve_content_type {
            response.headers().get(header::CONTENT_TYPE).cloned()
        } else {
            None
        };

        let body = response
            .bytes()
            .await
            .map_err(|e| ForwardError::ResponseRead(describe(&e)))?;

        Ok(Relayed {
            body,
            content_type,
            upstream_status,
            relayed_at: SystemTime::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn forwarder(config: RelayConfig) -> Forwarder {
        let mut config = config;
        config.forward.use_system_proxy = false;
        config.timeouts.connect_secs = 2;
        config.timeouts.request_secs = 5;
        Forwarder::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn malformed_url_is_an_error_not_a_panic() {
        let f = forwarder(RelayConfig::default());
        let err = f.forward("GET", "not a url", Body::empty()).await.unwrap_err();
        assert!(matches!(err, ForwardError::RequestConstruction(_)));
        assert!(err.to_string().starts_with("HTTP Request Build Error"));
    }

    #[tokio::test]
    async fn missing_scheme_is_rejected() {
        let f = forwarder(RelayConfig::default());
        let err = f.forward("GET", "example.com/path", Body::empty()).await.unwrap_err();
        assert!(matches!(err, ForwardError::RequestConstruction(_)));
    }

    #[tokio::test]
    async fn invalid_method_token_is_rejected() {
        let f = forwarder(RelayConfig::default());
        let err = f
            .forward("BAD METHOD", "http://example.com/", Body::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::RequestConstruction(_)));

        let err = f.forward("", "http://example.com/", Body::empty()).await.unwrap_err();
        assert!(matches!(err, ForwardError::RequestConstruction(_)));
    }

    #[tokio::test]
    async fn unsupported_scheme_is_construction_error() {
        let f = forwarder(RelayConfig::default());
        let err = f.forward("GET", "ftp://example.com/x", Body::empty()).await.unwrap_err();
        assert!(matches!(err, ForwardError::RequestConstruction(_)));
    }

    #[tokio::test]
    async fn private_target_rejected_by_policy() {
        let mut config = RelayConfig::default();
        config.security.block_private_targets = true;
        let f = forwarder(config);
        let err = f.forward("GET", "http://127.0.0.1:1/", Body::empty()).await.unwrap_err();
        assert!(matches!(err, ForwardError::TargetRejected(_)));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_before_sending() {
        let mut config = RelayConfig::default();
        config.security.max_body_size = 4;
        let f = forwarder(config);
        let err = f
            .forward("POST", "http://127.0.0.1:1/", Body::from("too large"))
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::RequestConstruction(_)));
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let f = forwarder(RelayConfig::default());
        let err = f
            .forward("GET", &format!("http://{addr}/"), Body::empty())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert!(err.to_string().starts_with("HTTP Request Error"));
    }
}
