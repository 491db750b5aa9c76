//! Layered configuration loading.

use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::LeadgenConfig;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `workspace_root`.
    ///
    /// Layers, lowest first: defaults, global file, `config/config.toml`,
    /// `config/{LEADGEN_ENV}.toml`, `LEADGEN__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<LeadgenConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load from one explicit file instead of the global and workspace files.
    /// Environment variables still apply on top.
    pub fn load_from_file(path: &Path) -> Result<LeadgenConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
