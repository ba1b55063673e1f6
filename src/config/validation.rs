//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, windows > 0)
//! - Check addresses parse before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// Algorithms the token codec can sign with.
pub const SUPPORTED_ALGORITHMS: &[&str] = &["HS256"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("auth.secret must not be empty")]
    EmptySecret,

    #[error("auth.algorithm `{0}` is not supported")]
    UnsupportedAlgorithm(String),

    #[error("auth.expiration_secs must be greater than zero")]
    ZeroExpiration,

    #[error("auth.expiration_secs must not exceed {max}")]
    ExpirationTooLarge { max: i64 },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("{field} `{value}` is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("cors.allowed_origins contains an empty entry")]
    EmptyOrigin,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    }
    if !SUPPORTED_ALGORITHMS.contains(&config.auth.algorithm.as_str()) {
        errors.push(ValidationError::UnsupportedAlgorithm(
            config.auth.algorithm.clone(),
        ));
    }
    if config.auth.expiration_secs == 0 {
        errors.push(ValidationError::ZeroExpiration);
    }
    if i64::try_from(config.auth.expiration_secs).is_err() {
        errors.push(ValidationError::ExpirationTooLarge { max: i64::MAX });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
    if config.cors.allowed_origins.iter().any(|o| o.trim().is_empty()) {
        errors.push(ValidationError::EmptyOrigin);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
