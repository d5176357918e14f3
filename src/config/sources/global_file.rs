//! Global config file source: $XDG_CONFIG_HOME/quilt/config.toml or ~/.config/quilt/config.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::File;
use std::path::PathBuf;
use tracing::debug;

/// Path to global config file.
pub fn global_config_path() -> Option<PathBuf> {
    let config_home = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".config"))
        })?;
    Some(config_home.join("quilt").join("config.toml"))
}

/// Add global config file source to builder if it exists.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    match global_config_path() {
        Some(path) if path.exists() => {
            builder.add_source(File::from(path).required(false))
        }
        Some(path) => {
            debug!(config_path = %path.display(), "No global configuration file");
            builder
        }
        None => builder,
    }
}
