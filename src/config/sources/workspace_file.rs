//! Workspace config files: `config/config.toml`, then `config/{LEADGEN_ENV}.toml`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_SELECTOR: &str = "LEADGEN_ENV";
const DEFAULT_ENV: &str = "development";

/// Workspace layers that apply, lowest precedence first.
pub fn workspace_layers(workspace_root: &Path) -> Vec<PathBuf> {
    let env_name = std::env::var(ENV_SELECTOR).unwrap_or_else(|_| DEFAULT_ENV.to_string());
    let config_dir = workspace_root.join("config");
    [
        config_dir.join("config.toml"),
        config_dir.join(format!("{env_name}.toml")),
    ]
    .into_iter()
    .filter(|path| path.is_file())
    .collect()
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(workspace_layers(workspace_root)
        .into_iter()
        .fold(builder, |builder, path| {
            debug!(config_path = %path.display(), "Adding workspace configuration");
            builder.add_source(File::from(path).required(false))
        }))
}
