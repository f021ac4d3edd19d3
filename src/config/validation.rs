//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Candidate URLs parse and use http(s)
//! - Timeouts and thresholds are non-zero
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ClientConfig;
use crate::resolver::{Candidate, CandidateError};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backends.{list}[{index}] is not a valid URL: {value}")]
    InvalidUrl {
        list: &'static str,
        index: usize,
        value: String,
    },

    #[error("backends.{list}[{index}] must use http or https: {value}")]
    UnsupportedScheme {
        list: &'static str,
        index: usize,
        value: String,
    },

    #[error("backends.{list}[{index}] duplicates an earlier candidate: {value}")]
    DuplicateUrl {
        list: &'static str,
        index: usize,
        value: String,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("observability.metrics_address is not a socket address: {0}")]
    MetricsAddress(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_candidates("remote", &config.backends.remote, &mut errors);
    check_candidates("local", &config.backends.local, &mut errors);

    let t = &config.timeouts;
    for (name, value) in [
        ("timeouts.health_secs", t.health_secs),
        ("timeouts.chat_secs", t.chat_secs),
        ("timeouts.query_secs", t.query_secs),
        ("timeouts.match_secs", t.match_secs),
        ("timeouts.refresh_secs", t.refresh_secs),
        ("health_check.interval_secs", config.health_check.interval_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero(name));
        }
    }
    if config.health_check.healthy_threshold == 0 {
        errors.push(ValidationError::Zero("health_check.healthy_threshold"));
    }
    if config.health_check.unhealthy_threshold == 0 {
        errors.push(ValidationError::Zero("health_check.unhealthy_threshold"));
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Uses the same parsing and normalization as `CandidateList`, so a config
/// that validates always builds.
fn check_candidates(list: &'static str, urls: &[String], errors: &mut Vec<ValidationError>) {
    let mut seen: Vec<Candidate> = Vec::with_capacity(urls.len());
    for (index, value) in urls.iter().enumerate() {
        match Candidate::parse(value) {
            Ok(candidate) if seen.contains(&candidate) => {
                errors.push(ValidationError::DuplicateUrl {
                    list,
                    index,
                    value: value.clone(),
                });
            }
            Ok(candidate) => seen.push(candidate),
            Err(CandidateError::UnsupportedScheme(_)) => {
                errors.push(ValidationError::UnsupportedScheme {
                    list,
                    index,
                    value: value.clone(),
                });
            }
            Err(_) => {
                errors.push(ValidationError::InvalidUrl {
                    list,
                    index,
                    value: value.clone(),
                });
            }
        }
    }
}
