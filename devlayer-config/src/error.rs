//! Failures while assembling a [`DevLayerConfig`](crate::DevLayerConfig).

use std::fmt::Write;
use std::path::PathBuf;

use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist. The default
    /// `config/` files are optional and never produce this.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// A queue, registry or event loop setting is out of range.
    #[error("Invalid configuration:\n{}", describe_ranges(.0))]
    Validation(#[source] ValidationErrors),

    /// A value that is in range but unusable, such as an unknown log level.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The YAML layers or `DEVLAYER_*` variables could not be merged into
    /// the config shape.
    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] Box<figment::Error>),
}

/// One line per offending key path, e.g. `core.registry.max_handlers: range`.
fn describe_ranges(errors: &ValidationErrors) -> String {
    let mut out = String::new();
    describe_into(&mut out, "", errors);
    out
}

fn describe_into(out: &mut String, prefix: &str, errors: &ValidationErrors) {
    for (key, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };
        match kind {
            ValidationErrorsKind::Field(failures) => {
                for failure in failures {
                    let reason = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| failure.code.to_string());
                    let _ = writeln!(out, "  {path}: {reason}");
                }
            }
            ValidationErrorsKind::Struct(nested) => describe_into(out, &path, nested),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    describe_into(out, &format!("{path}[{index}]"), nested);
                }
            }
        }
    }
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::Parsing(Box::new(error))
    }
}
