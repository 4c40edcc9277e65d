//! Configuration validation.
//!
//! Validates configuration and collects all errors before returning,
//! enabling users to fix multiple issues in a single iteration.

use crate::config::types::{ObservabilityConfig, ServiceConfig, ShutdownConfig};
use crate::errors::ConfigError;
use std::collections::HashSet;

/// Minimum deadline for the drain and callback stages: 1 second.
const MIN_STAGE_DEADLINE: u64 = 1;
/// Maximum deadline for the drain and callback stages: 300 seconds.
const MAX_STAGE_DEADLINE: u64 = 300;

/// Minimum escalation deadline: 1 second.
const MIN_ESCALATION_DEADLINE: u64 = 1;
/// Maximum escalation deadline: 600 seconds.
const MAX_ESCALATION_DEADLINE: u64 = 600;

/// Validate the entire service configuration.
///
/// Collects all validation errors and returns them together, allowing users
/// to fix multiple issues at once.
pub fn validate_config(config: &ServiceConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    validate_listeners(config, &mut errors);
    validate_shutdown_config(&config.shutdown, &mut errors);
    validate_observability_config(&config.observability, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed(errors))
    }
}

fn validate_listeners(config: &ServiceConfig, errors: &mut Vec<String>) {
    if config.listeners.is_empty() {
        errors.push("listeners must contain at least one entry".to_string());
    }

    let mut seen = HashSet::new();
    for listener in &config.listeners {
        if listener.name.is_empty() {
            errors.push(format!(
                "listener '{}' must have a non-empty name",
                listener.addr
            ));
        } else if !seen.insert(listener.name.as_str()) {
            errors.push(format!("duplicate listener name '{}'", listener.name));
        }

        validate_addr(&listener.name, &listener.addr, errors);
    }
}

fn validate_addr(name: &str, addr: &str, errors: &mut Vec<String>) {
    if addr.is_empty() {
        errors.push(format!("listener '{}' addr cannot be empty", name));
        return;
    }

    if !addr.contains(':') {
        errors.push(format!(
            "listener '{}' addr '{}' must be in host:port format",
            name, addr
        ));
        return;
    }

    let parts: Vec<&str> = addr.rsplitn(2, ':').collect();
    if parts.len() == 2 && parts[0].parse::<u16>().is_err() {
        errors.push(format!("listener '{}' addr '{}' has invalid port", name, addr));
    }
}

fn validate_shutdown_config(config: &ShutdownConfig, errors: &mut Vec<String>) {
    for (field, value) in [
        ("shutdown.drain_deadline_secs", config.drain_deadline_secs),
        ("shutdown.callback_deadline_secs", config.callback_deadline_secs),
    ] {
        if value < MIN_STAGE_DEADLINE {
            errors.push(format!(
                "{} must be at least {} second(s)",
                field, MIN_STAGE_DEADLINE
            ));
        }
        if value > MAX_STAGE_DEADLINE {
            errors.push(format!(
                "{} must be at most {} seconds",
                field, MAX_STAGE_DEADLINE
            ));
        }
    }

    if config.escalation_deadline_secs < MIN_ESCALATION_DEADLINE {
        errors.push(format!(
            "shutdown.escalation_deadline_secs must be at least {} second(s)",
            MIN_ESCALATION_DEADLINE
        ));
    }
    if config.escalation_deadline_secs > MAX_ESCALATION_DEADLINE {
        errors.push(format!(
            "shutdown.escalation_deadline_secs must be at most {} seconds",
            MAX_ESCALATION_DEADLINE
        ));
    }
}

fn validate_observability_config(config: &ObservabilityConfig, errors: &mut Vec<String>) {
    let valid_levels = ["trace", "debug", "info", "warn", "warning", "error"];
    if !valid_levels.contains(&config.log_level.to_lowercase().as_str()) {
        errors.push(format!(
            "observability.log_level '{}' is invalid. Valid levels: trace, debug, info, warn, error",
            config.log_level
        ));
    }

    let valid_formats = ["json", "pretty", "text", "human"];
    if !valid_formats.contains(&config.log_format.to_lowercase().as_str()) {
        errors.push(format!(
            "observability.log_format '{}' is invalid. Valid formats: json, pretty",
            config.log_format
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::ListenerConfig;

    fn valid_config() -> ServiceConfig {
        ServiceConfig {
            listeners: vec![
                ListenerConfig {
                    name: "biz".to_string(),
                    addr: "127.0.0.1:8082".to_string(),
                },
                ListenerConfig {
                    name: "admin".to_string(),
                    addr: "127.0.0.1:8081".to_string(),
                },
            ],
            shutdown: ShutdownConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let config = valid_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_listeners_fails() {
        let mut config = valid_config();
        config.listeners.clear();

        let err = validate_config(&config).unwrap_err();
        match err {
            ConfigError::ValidationFailed(errors) => {
                assert!(errors.iter().any(|e| e.contains("at least one")));
            }
            _ => panic!("Expected ValidationFailed error"),
        }
    }

    #[test]
    fn test_duplicate_listener_name_fails() {
        let mut config = valid_config();
        config.listeners[1].name = "biz".to_string();

        let err = validate_config(&config).unwrap_err();
        match err {
            ConfigError::ValidationFailed(errors) => {
                assert!(errors.iter().any(|e| e.contains("duplicate listener name")));
            }
            _ => panic!("Expected ValidationFailed error"),
        }
    }

    #[test]
    fn test_invalid_addr_format() {
        let mut config = valid_config();
        config.listeners[0].addr = "invalid".to_string();

        let err = validate_config(&config).unwrap_err();
        match err {
            ConfigError::ValidationFailed(errors) => {
                assert!(errors.iter().any(|e| e.contains("host:port")));
            }
            _ => panic!("Expected ValidationFailed error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut config = valid_config();
        config.listeners[0].addr = "127.0.0.1:notaport".to_string();

        let err = validate_config(&config).unwrap_err();
        match err {
            ConfigError::ValidationFailed(errors) => {
                assert!(errors.iter().any(|e| e.contains("invalid port")));
            }
            _ => panic!("Expected ValidationFailed error"),
        }
    }

    #[test]
    fn test_deadline_bounds() {
        let mut config = valid_config();
        config.shutdown.drain_deadline_secs = 0;
        config.shutdown.callback_deadline_secs = MAX_STAGE_DEADLINE + 1;
        config.shutdown.escalation_deadline_secs = MAX_ESCALATION_DEADLINE + 1;

        let err = validate_config(&config).unwrap_err();
        match err {
            ConfigError::ValidationFailed(errors) => {
                assert!(errors.iter().any(|e| e.contains("drain_deadline_secs")));
                assert!(errors.iter().any(|e| e.contains("callback_deadline_secs")));
                assert!(errors.iter().any(|e| e.contains("escalation_deadline_secs")));
            }
            _ => panic!("Expected ValidationFailed error"),
        }
    }

    #[test]
    fn test_multiple_errors_collected() {
        let mut config = valid_config();
        config.listeners[0].name = String::new();
        config.listeners[1].addr = "nope".to_string();
        config.shutdown.drain_deadline_secs = 0;
        config.observability.log_level = "loud".to_string();

        let err = validate_config(&config).unwrap_err();
        match err {
            ConfigError::ValidationFailed(errors) => {
                assert!(
                    errors.len() >= 4,
                    "Expected at least 4 errors, got {}",
                    errors.len()
                );
            }
            _ => panic!("Expected ValidationFailed error"),
        }
    }

    #[test]
    fn test_invalid_log_level_and_format() {
        let mut config = valid_config();
        config.observability.log_level = "loud".to_string();
        config.observability.log_format = "xml".to_string();

        let err = validate_config(&config).unwrap_err();
        match err {
            ConfigError::ValidationFailed(errors) => {
                assert!(errors.iter().any(|e| e.contains("log_level")));
                assert!(errors.iter().any(|e| e.contains("log_format")));
            }
            _ => panic!("Expected ValidationFailed error"),
        }
    }
}
