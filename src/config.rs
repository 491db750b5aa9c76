//! Configuration System
//!
//! Hierarchical configuration for the generation service: built-in defaults, a global
//! file, workspace files and `LEADGEN__*` environment overrides, validated as a whole
//! before use.

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::error::GenerationError;
use crate::logging::LoggingConfig;
use crate::session::RunSettings;
use crate::source::{SourceConfig, SourceRegistry};
use crate::types::DEFAULT_COUNTRY;
use crate::validation::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Upper bound for `generation.max_target`.
pub const MAX_TARGET_LIMIT: u32 = 1000;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadgenConfig {
    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Sources in the order they are queried
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generation run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Leads per `batch` event
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Largest accepted `target_count`
    #[serde(default = "default_max_target")]
    pub max_target: u32,

    /// Country used when a request does not name one
    #[serde(default = "default_country")]
    pub default_country: String,

    /// Emit the leftover partial batch before `completed`
    #[serde(default = "default_true")]
    pub flush_partial_batch: bool,

    /// Finished sessions kept in memory and in the journal
    #[serde(default = "default_retained_sessions")]
    pub retained_sessions: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_target() -> u32 {
    MAX_TARGET_LIMIT
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

fn default_true() -> bool {
    true
}

fn default_retained_sessions() -> usize {
    32
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_target: default_max_target(),
            default_country: default_country(),
            flush_partial_batch: default_true(),
            retained_sessions: default_retained_sessions(),
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        if !(1..=MAX_TARGET_LIMIT).contains(&self.max_target) {
            return Err(format!(
                "max_target must be between 1 and {MAX_TARGET_LIMIT}, got {}",
                self.max_target
            ));
        }
        if self.default_country.trim().is_empty() {
            return Err("default_country cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Storage paths. Relative paths are resolved against the workspace root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default = "default_journal_path")]
    pub journal_path: PathBuf,

    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Exports older than this are removed by `cleanup`
    #[serde(default = "default_export_retention_hours")]
    pub export_retention_hours: u64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".leadgen/store")
}

fn default_journal_path() -> PathBuf {
    PathBuf::from(".leadgen/journal")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".leadgen/exports")
}

fn default_export_retention_hours() -> u64 {
    24
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            journal_path: default_journal_path(),
            export_dir: default_export_dir(),
            export_retention_hours: default_export_retention_hours(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.store_path.as_os_str().is_empty() {
            return Err("Store path cannot be empty".to_string());
        }
        if self.journal_path.as_os_str().is_empty() {
            return Err("Journal path cannot be empty".to_string());
        }
        if self.export_dir.as_os_str().is_empty() {
            return Err("Export directory cannot be empty".to_string());
        }
        Ok(())
    }

    /// Copy with every relative path joined onto `workspace_root`.
    pub fn resolved(&self, workspace_root: &Path) -> StorageConfig {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                workspace_root.join(p)
            }
        };
        StorageConfig {
            store_path: resolve(&self.store_path),
            journal_path: resolve(&self.journal_path),
            export_dir: resolve(&self.export_dir),
            export_retention_hours: self.export_retention_hours,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Generation(String),
    Validation(String),
    Storage(String),
    Source(String, String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Generation(msg) => write!(f, "Generation: {}", msg),
            ValidationError::Validation(msg) => write!(f, "Validation: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Source(id, msg) => write!(f, "Source '{}': {}", id, msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl LeadgenConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }
        if let Err(e) = self.validation.validate() {
            errors.push(ValidationError::Validation(e));
        }
        if let Err(e) = self.storage.validate() {
            errors.push(ValidationError::Storage(e));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if let Err(e) = source.validate() {
                errors.push(ValidationError::Source(source.id.clone(), e));
            }
            if !seen.insert(source.id.as_str()) {
                errors.push(ValidationError::Source(
                    source.id.clone(),
                    "Duplicate source id".to_string(),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// [`validate`](Self::validate), folded into a single error for callers that stop on it.
    pub fn ensure_valid(&self) -> Result<(), GenerationError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            GenerationError::Config(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            batch_size: self.generation.batch_size,
            flush_partial_batch: self.generation.flush_partial_batch,
            validation: self.validation.clone(),
        }
    }

    /// Registry of the configured fixture sources, fixture paths relative to `base_dir`.
    pub fn build_registry(&self, base_dir: &Path) -> Result<SourceRegistry, GenerationError> {
        SourceRegistry::from_config(&self.sources, base_dir)
    }
}
