//! Post-parse configuration validation.
//!
//! Checks value ranges and cross-trigger invariants of a parsed
//! [`ModuleConfig`](crate::ModuleConfig).

use std::collections::HashMap;

use crate::error::{ConfigError, ConfigResult};
use crate::types::ModuleConfig;

/// Upper bound for `timeout`, in seconds.
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Validate a parsed configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &ModuleConfig) -> ConfigResult<()> {
    validate_timeouts(config)?;
    validate_triggers(config)?;
    Ok(())
}

fn validate_timeouts(config: &ModuleConfig) -> ConfigResult<()> {
    if config.timeout_secs == 0 || config.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::ValidationError {
            field: "timeout".to_owned(),
            message: format!("timeout must be between 1 and {MAX_TIMEOUT_SECS} seconds"),
        });
    }

    if config.conn_timeout_secs == 0 || config.conn_timeout_secs > config.timeout_secs {
        return Err(ConfigError::ValidationError {
            field: "conn_timeout".to_owned(),
            message: format!(
                "conn_timeout must be between 1 and timeout ({} seconds)",
                config.timeout_secs
            ),
        });
    }

    Ok(())
}

fn validate_triggers(config: &ModuleConfig) -> ConfigResult<()> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    for trigger in &config.triggers {
        if trigger.trigger.is_empty() || trigger.trigger.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError {
                field: format!("{}.trigger", trigger.index),
                message: format!("'{}' is not a single word", trigger.trigger),
            });
        }

        if let Some(first) = seen.insert(trigger.trigger.to_lowercase(), trigger.index) {
            return Err(ConfigError::DuplicateTrigger {
                trigger: trigger.trigger.clone(),
                first,
                second: trigger.index,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TriggerConfig;

    fn config(triggers: Vec<TriggerConfig>) -> ModuleConfig {
        ModuleConfig {
            triggers,
            ..ModuleConfig::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&ModuleConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut cfg = ModuleConfig::default();
        cfg.timeout_secs = 0;
        let err = validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_conn_timeout_above_timeout_rejected() {
        let mut cfg = ModuleConfig::default();
        cfg.conn_timeout_secs = 9;
        assert!(matches!(
            validate(&cfg),
            Err(ConfigError::ValidationError { ref field, .. }) if field == "conn_timeout"
        ));
    }

    #[test]
    fn test_duplicate_trigger_case_insensitive() {
        let cfg = config(vec![
            TriggerConfig::new(1, "weather", "u", "f"),
            TriggerConfig::new(2, "WEATHER", "u", "f"),
        ]);
        assert!(matches!(
            validate(&cfg),
            Err(ConfigError::DuplicateTrigger {
                first: 1,
                second: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_multi_word_trigger_rejected() {
        let cfg = config(vec![TriggerConfig::new(1, "the weather", "u", "f")]);
        assert!(validate(&cfg).is_err());
        let cfg = config(vec![TriggerConfig::new(1, "", "u", "f")]);
        assert!(validate(&cfg).is_err());
    }
}
