//! Outbound HTTP client construction.
//!
//! One client is built at startup and shared by every forwarding call; it
//! owns the connection pool and is cheap to clone.

use std::time::Duration;

use crate::config::{ForwardConfig, TimeoutConfig};

/// Build the shared outbound client.
///
/// Both a connect timeout and a total request timeout are always set, so a
/// forwarding call can never hang on a silent upstream.
pub fn build_client(
    timeouts: &TimeoutConfig,
    forward: &ForwardConfig,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.request_secs));

    if !forward.use_system_proxy {
        builder = builder.no_proxy();
    }

    builder.build()
}
