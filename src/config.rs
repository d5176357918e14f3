//! Configuration System
//!
//! Layered configuration: built-in defaults, the global config file, the
//! project's `config/` directory and `QUILT_*` environment variables, later
//! layers overriding earlier ones. Everything is validated after loading.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod merge;
mod sources;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuiltConfig {
    /// Scheduler limits and automation
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Replay recorded actions in contexts that look exactly like one seen before
    #[serde(default = "default_true")]
    pub automation: bool,

    /// Upper bound on automatic replays triggered by a single action
    #[serde(default = "default_max_automated_steps")]
    pub max_automated_steps: usize,

    /// Deepest allowed subquestion nesting; unlimited when absent
    #[serde(default)]
    pub max_depth: Option<usize>,
}

fn default_true() -> bool {
    true
}

fn default_max_automated_steps() -> usize {
    1000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            automation: default_true(),
            max_automated_steps: default_max_automated_steps(),
            max_depth: None,
        }
    }
}

impl SchedulerConfig {
    /// Validate scheduler configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_automated_steps == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.max_automated_steps must be greater than zero".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(ConfigError::Invalid(
                "scheduler.max_depth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl QuiltConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.validate()?;

        match self.logging.format.as_str() {
            "text" | "json" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "logging.format must be 'text' or 'json', got '{}'",
                    other
                )))
            }
        }
        match self.logging.output.as_str() {
            "stdout" | "stderr" | "file" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "logging.output must be 'stdout', 'stderr' or 'file', got '{}'",
                other
            ))),
        }
    }

    /// Render as TOML, e.g. to seed a config file
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Loads [`QuiltConfig`] from its layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a project rooted at `root`
    ///
    /// Precedence (highest last): defaults, global file, `config/config.toml`,
    /// `config/{QUILT_ENV}.toml`, environment.
    pub fn load(root: &Path) -> Result<QuiltConfig, ConfigError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder);
        let builder = sources::workspace_file::add_to_builder(builder, root);
        let builder = sources::add_environment(builder);

        let config: QuiltConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a single file, on top of the defaults only
    pub fn load_from_file(path: &Path) -> Result<QuiltConfig, ConfigError> {
        let config: QuiltConfig = merge::builder_with_defaults()?
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Location of the global config file, if one can be determined
    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }
}
