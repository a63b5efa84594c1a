//! Checks applied after the derive-based validation.

use crate::{ConfigError, DevLayerConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate the default log level.
pub fn validate_log_level(level: &str) -> Result<(), ConfigError> {
    if LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "telemetry.log_level '{level}' is not one of {}",
            LOG_LEVELS.join(", ")
        )))
    }
}

/// Validate the thread name is usable as an OS thread name.
pub fn validate_thread_name(name: &str) -> Result<(), ConfigError> {
    if name.contains('\0') {
        return Err(ConfigError::Invalid(
            "core.event_loop.thread_name must not contain NUL bytes".into(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_semantics(config: &DevLayerConfig) -> Result<(), ConfigError> {
    validate_log_level(&config.telemetry.log_level)?;
    validate_thread_name(&config.core.event_loop.thread_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_levels_in_any_case() {
        assert!(validate_log_level("debug").is_ok());
        assert!(validate_log_level("WARN").is_ok());
    }

    #[test]
    fn rejects_unknown_levels() {
        assert!(matches!(
            validate_log_level("verbose"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_nul_in_thread_name() {
        assert!(validate_thread_name("loop\0").is_err());
        assert!(validate_thread_name("loop").is_ok());
    }
}
