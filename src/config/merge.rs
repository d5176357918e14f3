//! Merge rules: defaults first, later sources override earlier ones.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with the built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("scheduler.automation", true)?
        .set_default("scheduler.max_automated_steps", 1000_i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
