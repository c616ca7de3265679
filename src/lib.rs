//! Inbound connection gateway for an audio control node.
//!
//! One listener classifies every connection as a control-channel upgrade or
//! a REST request, authenticates both against a shared secret, and routes
//! REST traffic through an exact-match route table with a plugin fallback.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
