//! # devlayer Configuration System
//!
//! Hierarchical configuration for the device layer.
//!
//! ## Features
//! - **Unified Configuration**: one document for the dispatch core and telemetry
//! - **Validation**: range checks via `validator` plus semantic checks
//! - **Environment Awareness**: per-environment overrides and `DEVLAYER_*` variables

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod core;
mod error;
mod telemetry;
mod validation;

pub use self::core::{CoreConfig, EventLoopConfig, EventQueueConfig, RegistryConfig};
pub use error::ConfigError;
pub use telemetry::TelemetryConfig;
pub use validation::{validate_log_level, validate_thread_name};

const BASE_FILE: &str = "config/devlayer.yaml";
const ENV_PREFIX: &str = "DEVLAYER_";

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct DevLayerConfig {
    /// Dispatch core configuration (queue, registry, event loop).
    #[serde(default)]
    #[validate(nested)]
    pub core: CoreConfig,

    /// Logging and metrics configuration.
    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl DevLayerConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/devlayer.yaml`, if present
    /// 3. `config/<DEVLAYER_ENV>.yaml`, if present (`DEVLAYER_ENV` defaults to `production`)
    /// 4. `DEVLAYER_*` environment variables, `__` separating nested keys
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(DevLayerConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        }

        let env = std::env::var("DEVLAYER_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load configuration from a specific file layered over the defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        Self::extract(
            Figment::from(Serialized::defaults(DevLayerConfig::default()))
                .merge(Yaml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        validation::validate_semantics(&config)?;
        Ok(config)
    }

    /// Idle wait of the event loop as a [`Duration`].
    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.core.event_loop.idle_wait_ms)
    }
}
