//! Runtime Configuration Module
//!
//! Loads [`RuntimeConfig`] from an optional TOML file with environment
//! variable overrides.

use crate::logging::LoggingConfig;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const ENV_PREFIX: &str = "TROUPE";

/// Knobs of one program run
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// State every actor starts in
    pub initial_state: String,

    /// Message broadcast to the root actors once the group runs
    pub initial_message: String,

    /// Per-actor inbox capacity; 0 asks for a hand-off inbox
    pub inbox_capacity: usize,

    pub logging: LoggingConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            initial_state: "Main".to_string(),
            initial_message: "start".to_string(),
            inbox_capacity: 0,
            logging: LoggingConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration, the file (when given) being required
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading runtime config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: RuntimeConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!(
            initial_state = %config.initial_state,
            initial_message = %config.initial_message,
            inbox_capacity = config.inbox_capacity,
            "Runtime config loaded"
        );
        Ok(config)
    }

    /// Reject values no program can run with
    pub fn validate(&self) -> Result<()> {
        if self.initial_state.trim().is_empty() {
            bail!("initial_state must not be empty");
        }
        if self.initial_message.trim().is_empty() {
            bail!("initial_message must not be empty");
        }
        self.logging.validate().context("Invalid logging section")
    }
}
