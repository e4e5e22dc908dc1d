//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges (timeouts > 0, limits > 0)
//! - Check that the inbound request timeout outlives a worst-case forward
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::RelayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("service.name must not be empty")]
    EmptyServiceName,

    #[error(
        "timeouts.request_secs ({request_secs}s) must exceed forwarding connect + read timeouts ({forward_ms}ms)"
    )]
    RequestTimeoutTooShort { request_secs: u64, forward_ms: u64 },
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if let Some(ingress) = &config.listener.ingress_address {
        check_address(&mut errors, "listener.ingress_address", ingress);
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }
    if config.forwarding.connect_timeout_ms == 0 {
        errors.push(ValidationError::Zero("forwarding.connect_timeout_ms"));
    }
    if config.forwarding.read_timeout_ms == 0 {
        errors.push(ValidationError::Zero("forwarding.read_timeout_ms"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("limits.max_body_bytes"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    } else {
        let forward_ms = config
            .forwarding
            .connect_timeout_ms
            .saturating_add(config.forwarding.read_timeout_ms);
        if config.timeouts.request_secs.saturating_mul(1000) <= forward_ms {
            errors.push(ValidationError::RequestTimeoutTooShort {
                request_secs: config.timeouts.request_secs,
                forward_ms,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
