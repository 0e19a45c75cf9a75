//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! rules. Every violation is reported, not just the first.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a [`RelayConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.host must not be empty")]
    EmptyHost,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("security.allowed_schemes must list at least one scheme")]
    NoSchemes,

    #[error("security.allowed_schemes contains unsupported scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("cors.allowed_origins must not be empty")]
    NoOrigins,

    #[error("cors.allowed_origins cannot mix `*` with explicit origins")]
    MixedWildcardOrigin,

    #[error("cors.allowed_origins contains invalid origin `{0}`")]
    InvalidOrigin(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Schemes the outbound client can speak.
const SUPPORTED_SCHEMES: &[&str] = &["http", "https"];

/// Validate a configuration, returning every violation found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.security.allowed_schemes.is_empty() {
        errors.push(ValidationError::NoSchemes);
    }
    for scheme in &config.security.allowed_schemes {
        if !SUPPORTED_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
            errors.push(ValidationError::UnsupportedScheme(scheme.clone()));
        }
    }

    let origins = &config.cors.allowed_origins;
    if origins.is_empty() {
        errors.push(ValidationError::NoOrigins);
    } else if origins.iter().any(|o| o == "*") {
        if origins.len() > 1 {
            errors.push(ValidationError::MixedWildcardOrigin);
        }
    } else {
        for origin in origins {
            if HeaderValue::from_str(origin).is_err() {
                errors.push(ValidationError::InvalidOrigin(origin.clone()));
            }
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
