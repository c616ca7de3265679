//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (port, addresses)
//! - Validate header names and values before they reach the router
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{IpAddr, SocketAddr};

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.address is not an IP address: {0:?}")]
    InvalidAddress(String),

    #[error("server.port must not be 0")]
    ZeroPort,

    #[error("server.user_id_header is not a valid header name: {0:?}")]
    InvalidUserIdHeader(String),

    #[error("server.response_headers: invalid header name {0:?}")]
    InvalidHeaderName(String),

    #[error("server.response_headers: invalid value for {0:?}")]
    InvalidHeaderValue(String),

    #[error("observability.metrics_address is not a socket address: {0:?}")]
    InvalidMetricsAddress(String),
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let server = &config.server;

    if server.address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress(server.address.clone()));
    }
    if server.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if HeaderName::from_bytes(server.user_id_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidUserIdHeader(server.user_id_header.clone()));
    }
    for (name, value) in &server.response_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        } else if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidHeaderValue(name.clone()));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.server.address = "not-an-ip".into();
        config.server.port = 0;
        config.server.user_id_header = "user id".into();
        config.server.response_headers.insert("bad header".into(), "x".into());
        config.server.response_headers.insert("X-Ok".into(), "line\nbreak".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::ZeroPort));
        assert!(errors.contains(&ValidationError::InvalidHeaderValue("X-Ok".into())));
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::InvalidMetricsAddress("nowhere".into())]
        );
    }
}
