// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, unique job names, and bounded poll sizes.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::CoachConfig;

/// Slack allows at most five buttons per actions block.
pub const MAX_POLL_SIZE: usize = 5;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CoachConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.bind_address must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "server.bind_address `{addr}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if config.server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "server.port must be non-zero".to_string(),
        });
    }

    if config.state.dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "state.dir must not be empty".to_string(),
        });
    }

    if config.topics.poll_size > MAX_POLL_SIZE {
        errors.push(ConfigError::Validation {
            message: format!(
                "topics.poll_size must be at most {MAX_POLL_SIZE}, got {}",
                config.topics.poll_size
            ),
        });
    }

    if config.generator.max_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "generator.max_tokens must be non-zero".to_string(),
        });
    }

    if !(0.0..=1.0).contains(&config.generator.temperature) {
        errors.push(ConfigError::Validation {
            message: format!(
                "generator.temperature must be between 0.0 and 1.0, got {}",
                config.generator.temperature
            ),
        });
    }

    let mut seen_names = HashSet::new();
    for (i, job) in config.jobs.iter().enumerate() {
        if job.name.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("jobs[{i}].name must not be empty"),
            });
        } else if !seen_names.insert(job.name.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate job name `{}` in [[jobs]] array", job.name),
            });
        }
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
    use crate::model::JobConfig;

    fn job(name: &str) -> JobConfig {
        JobConfig {
            name: name.to_string(),
            channel: None,
            title_prefix: "Coach".to_string(),
            topics: Vec::new(),
        }
    }

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = CoachConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_bind_address_fails_validation() {
        let mut config = CoachConfig::default();
        config.server.bind_address = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "bind_address"));
    }

    #[test]
    fn zero_port_fails_validation() {
        let mut config = CoachConfig::default();
        config.server.port = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "server.port"));
    }

    #[test]
    fn oversized_poll_fails_validation() {
        let mut config = CoachConfig::default();
        config.topics.poll_size = 9;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "poll_size"));
    }

    #[test]
    fn generator_bounds_are_checked() {
        let mut config = CoachConfig::default();
        config.generator.max_tokens = 0;
        config.generator.temperature = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "generator.max_tokens"));
        assert!(has_message(&errors, "generator.temperature"));
    }

    #[test]
    fn duplicate_job_names_fail_validation() {
        let mut config = CoachConfig::default();
        config.jobs = vec![job("postgres"), job("postgres"), job("data_engineering")];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(has_message(&errors, "duplicate job name `postgres`"));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = CoachConfig::default();
        config.server.port = 0;
        config.state.dir = String::new();
        config.jobs = vec![job("")];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
