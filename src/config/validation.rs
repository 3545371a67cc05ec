//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that an issuer can be built when a user pool is configured
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EmulatorConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::EmulatorConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid listener.bind_address '{0}'")]
    BindAddress(String),

    #[error("invalid observability.metrics_address '{0}'")]
    MetricsAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("unknown observability.log_format '{0}' (expected pretty or json)")]
    LogFormat(String),

    #[error("auth.user_pool_id requires auth.region or auth.authority")]
    MissingAuthority,

    #[error("invalid auth.authority '{0}'")]
    Authority(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &EmulatorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.http.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("http.max_body_bytes"));
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("http.request_timeout_secs"));
    }
    if config.auth.fetch_timeout_secs == 0 {
        errors.push(ValidationError::Zero("auth.fetch_timeout_secs"));
    }

    if config.auth.user_pool_id.is_some() && config.auth.authority().is_none() {
        errors.push(ValidationError::MissingAuthority);
    }
    if let Some(authority) = &config.auth.authority {
        if url::Url::parse(authority).is_err() {
            errors.push(ValidationError::Authority(authority.clone()));
        }
    }

    let obs = &config.observability;
    if !matches!(obs.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::LogFormat(obs.log_format.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
