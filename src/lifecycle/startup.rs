//! Startup reporting.
//!
//! # Responsibilities
//! - Describe the build and host once at startup
//! - Report how long startup took once the listener is bound

use std::time::Instant;

use crate::config::GatewayConfig;

/// Log version, process and host details.
pub fn log_startup_summary(config: &GatewayConfig) {
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        workers,
        auth = config.server.password.as_deref().is_some_and(|p| !p.is_empty()),
        "Starting control-gateway"
    );
}

/// Log that the listener is up, with elapsed startup time.
pub fn log_started(bind_address: &str, started: Instant) {
    tracing::info!(
        address = %bind_address,
        startup_secs = started.elapsed().as_secs_f64(),
        "Server started"
    );
}
