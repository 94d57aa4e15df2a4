//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (overrides and probes name known identities)
//! - Validate value ranges (thresholds >= 1, intervals > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GuardConfig;
use crate::identity::Identity;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{section}: unknown identity '{name}'")]
    UnknownIdentity { section: &'static str, name: String },

    #[error("breakers.{0}: failure_threshold must be at least 1")]
    ZeroThreshold(String),

    #[error("admin.api_key must not be empty when the admin API is enabled")]
    EmptyApiKey,

    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: String, value: String },

    #[error("probe.{0} must be greater than zero")]
    ZeroProbeSetting(&'static str),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (name, tuning) in &config.breakers {
        if name.parse::<Identity>().is_err() {
            errors.push(ValidationError::UnknownIdentity {
                section: "breakers",
                name: name.clone(),
            });
        }
        if tuning.failure_threshold == Some(0) {
            errors.push(ValidationError::ZeroThreshold(name.clone()));
        }
    }

    if config.admin.enabled {
        if config.admin.api_key.trim().is_empty() {
            errors.push(ValidationError::EmptyApiKey);
        }
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.probe.enabled {
        if config.probe.interval_secs == 0 {
            errors.push(ValidationError::ZeroProbeSetting("interval_secs"));
        }
        if config.probe.timeout_secs == 0 {
            errors.push(ValidationError::ZeroProbeSetting("timeout_secs"));
        }
    }

    for (i, target) in config.probe.targets.iter().enumerate() {
        if target.identity.parse::<Identity>().is_err() {
            errors.push(ValidationError::UnknownIdentity {
                section: "probe.targets",
                name: target.identity.clone(),
            });
        }
        check_address(&mut errors, &format!("probe.targets[{}].address", i), &target.address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}
