// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Collects every problem in one pass so a bad config file can be fixed in a
//! single edit.

use crate::{ConfigError, ConfigResult, DualfilterConfig};

/// Longest settle delay accepted before the distribution stage sends
const MAX_SETTLE_DELAY_MS: u64 = 60_000;

const ENDPOINT_SCHEMES: &[&str] = &["tcp://", "ipc://", "inproc://"];
const BACKENDS: &[&str] = &["auto", "cpu", "wgpu", "gpu"];
const LOG_FORMATS: &[&str] = &["text", "json"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    InvalidEndpoint { field: String, endpoint: String },
    EndpointConflict { endpoint: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::InvalidEndpoint { field, endpoint } => {
                write!(
                    f,
                    "{} = '{}' must start with one of {}",
                    field,
                    endpoint,
                    ENDPOINT_SCHEMES.join(", ")
                )
            }
            Self::EndpointConflict { endpoint } => {
                write!(
                    f,
                    "Endpoint conflict: distribution and collection both use {}",
                    endpoint
                )
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failed check
pub fn validate_config(config: &DualfilterConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_required_fields(config, &mut errors);
    validate_endpoints(config, &mut errors);
    validate_value_ranges(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_required_fields(config: &DualfilterConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.pipeline.input.as_os_str().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "pipeline.input".to_string(),
        });
    }
    if config.pipeline.output.as_os_str().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "pipeline.output".to_string(),
        });
    }
}

fn validate_endpoints(config: &DualfilterConfig, errors: &mut Vec<ConfigValidationError>) {
    let channels = &config.channels;
    for (field, endpoint) in [
        ("channels.distribution_endpoint", &channels.distribution_endpoint),
        ("channels.collection_endpoint", &channels.collection_endpoint),
    ] {
        if endpoint.is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: field.to_string(),
            });
        } else if !ENDPOINT_SCHEMES.iter().any(|s| endpoint.starts_with(s)) {
            errors.push(ConfigValidationError::InvalidEndpoint {
                field: field.to_string(),
                endpoint: endpoint.clone(),
            });
        }
    }

    if !channels.distribution_endpoint.is_empty()
        && channels.distribution_endpoint == channels.collection_endpoint
    {
        errors.push(ConfigValidationError::EndpointConflict {
            endpoint: channels.distribution_endpoint.clone(),
        });
    }
}

fn validate_value_ranges(config: &DualfilterConfig, errors: &mut Vec<ConfigValidationError>) {
    if !config.pipeline.threshold.is_finite() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "pipeline.threshold".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if config.channels.settle_delay_ms > MAX_SETTLE_DELAY_MS {
        errors.push(ConfigValidationError::InvalidValue {
            field: "channels.settle_delay_ms".to_string(),
            reason: format!("must be at most {} ms", MAX_SETTLE_DELAY_MS),
        });
    }

    if config.channels.collection_timeout_ms == Some(0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "channels.collection_timeout_ms".to_string(),
            reason: "must be greater than 0 (omit it to wait for the sentinel)".to_string(),
        });
    }

    if config.compute.reliability_iterations == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "compute.reliability_iterations".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    if !BACKENDS.contains(&config.compute.backend.to_lowercase().as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "compute.backend".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.compute.backend,
                BACKENDS.join(", ")
            ),
        });
    }

    if config.workers.stability_iterations == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "workers.stability_iterations".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    if !config.workers.stability_threshold.is_finite() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "workers.stability_threshold".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if !LOG_FORMATS.contains(&config.logging.format.to_lowercase().as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.format".to_string(),
            reason: format!("'{}' is not one of {}", config.logging.format, LOG_FORMATS.join(", ")),
        });
    }
}
