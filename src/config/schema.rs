//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::security::auth::DEFAULT_USER_ID_HEADER;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener and authentication settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0").
    pub address: String,

    /// Bind port.
    pub port: u16,

    /// Shared secret clients send in `Authorization`. Empty disables auth.
    pub password: Option<String>,

    /// Header carrying the user id on control-channel upgrades.
    pub user_id_header: String,

    /// Headers added to the gateway's own 401/404/500 responses.
    pub response_headers: BTreeMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let mut response_headers = BTreeMap::new();
        response_headers.insert("Server".to_string(), "control-gateway".to_string());

        Self {
            address: "0.0.0.0".to_string(),
            port: 2333,
            password: None,
            user_id_header: DEFAULT_USER_ID_HEADER.to_string(),
            response_headers,
        }
    }
}

impl ServerConfig {
    /// `address:port`, bracketing IPv6 literals.
    pub fn bind_address(&self) -> String {
        if self.address.contains(':') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }

    /// The configured base headers. Entries that fail validation are skipped.
    pub fn base_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.response_headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Ignoring invalid response header"),
            }
        }
        headers
    }

    pub fn user_id_header_name(&self) -> HeaderName {
        HeaderName::from_bytes(self.user_id_header.as_bytes())
            .unwrap_or_else(|_| HeaderName::from_static(DEFAULT_USER_ID_HEADER))
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
