//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Log panics with location and backtrace
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Initialization is idempotent so tests can call it freely

use std::backtrace::Backtrace;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a configured level.
pub fn default_filter(level: &str) -> String {
    format!("cors_relay={level},tower_http={level}")
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_tracing(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

/// Route panics through tracing with a full backtrace.
///
/// The fault boundary still converts the panic into a response; this hook
/// only makes sure operators get the stack of the original fault.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = Backtrace::force_capture();
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        tracing::error!(
            location = %location,
            panic = %info,
            backtrace = %backtrace,
            "Panic in relay task"
        );
    }));
}
