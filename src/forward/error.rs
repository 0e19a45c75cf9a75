//! Forwarding error taxonomy.

use thiserror::Error;

/// Errors produced while relaying a single request.
///
/// Every variant is an ordinary result for the caller; none of them is a
/// reason to abort the process.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Method, URL or body could not form an outbound request.
    #[error("HTTP Request Build Error {0}")]
    RequestConstruction(String),

    /// The target was refused by the configured target policy.
    #[error("HTTP Request Target Rejected {0}")]
    TargetRejected(String),

    /// The outbound exchange failed (DNS, connect, TLS, timeout, reset).
    #[error("HTTP Request Error {0}")]
    Transport(String),

    /// The upstream answered but its body could not be read in full.
    #[error("HTTP Request Read Content Error {0}")]
    ResponseRead(String),
}

impl ForwardError {
    /// Short label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestConstruction(_) => "request_construction",
            Self::TargetRejected(_) => "target_rejected",
            Self::Transport(_) => "transport",
            Self::ResponseRead(_) => "response_read",
        }
    }
}

/// Render an error together with its whole `source()` chain.
///
/// `reqwest` keeps the interesting part (refused, timed out, DNS) in the
/// sources, so the top-level message alone is not enough for the caller.
pub fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
