//! Configuration sources, in increasing precedence.

pub mod global_file;
pub mod workspace_file;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

/// `QUILT_*` environment variables, `__` separating nested keys
/// (`QUILT_SCHEDULER__MAX_DEPTH=8`).
pub fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("QUILT")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
