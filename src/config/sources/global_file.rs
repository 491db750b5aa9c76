//! Per-user config file: `$XDG_CONFIG_HOME/leadgen/config.toml` (`~/.config/leadgen` on Linux).

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::PathBuf;
use tracing::debug;

pub fn global_config_path() -> Option<PathBuf> {
    let dirs = directories::BaseDirs::new()?;
    Some(dirs.config_dir().join("leadgen").join("config.toml"))
}

/// Adds the per-user file when present. Missing is not an error.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Some(path) = global_config_path() else {
        return Ok(builder);
    };
    if !path.is_file() {
        debug!(config_path = %path.display(), "No per-user configuration");
        return Ok(builder);
    }
    let path = dunce::canonicalize(&path).unwrap_or(path);
    Ok(builder.add_source(File::from(path).required(false)))
}
