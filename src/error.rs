//! Gateway-level error types.

use thiserror::Error;

/// Errors raised while assembling or running the gateway.
///
/// Request-scoped failures never surface here; they are turned into
/// responses by the dispatch error boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Listener bind or serve failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A path was registered twice in the route table.
    #[error("Route already registered: {0}")]
    DuplicateRoute(String),

    /// Route paths must be absolute.
    #[error("Route path must start with '/': {0:?}")]
    InvalidRoutePath(String),

    /// A route was registered without any allowed method.
    #[error("Route {0} allows no methods")]
    NoMethods(String),

    /// The control-channel handler could not be loaded.
    #[error("Failed to load upgrade handler: {0}")]
    UpgradeHandlerLoad(String),

    /// Metrics exporter could not be installed.
    #[error("Metrics exporter error: {0}")]
    Metrics(String),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, GatewayError>;
