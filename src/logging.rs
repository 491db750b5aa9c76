//! Logging
//!
//! Structured logging with `tracing`. The subscriber is configured from the `[logging]`
//! config section, with `LEADGEN_LOG*` environment variables taking precedence.

use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Turn logging off entirely
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path (if output is "file")
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Enable colored output (text format only, stdout/stderr only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from(".leadgen/leadgen.log")
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: default_log_file(),
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(GenerationError::Config(format!(
                "unknown log format '{other}', expected text or json"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogOutput {
    Stdout,
    Stderr,
    File,
}

impl FromStr for LogOutput {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            other => Err(GenerationError::Config(format!(
                "unknown log output '{other}', expected stdout, stderr or file"
            ))),
        }
    }
}

/// `LEADGEN_LOG_*` value when set, the configured value otherwise.
fn setting<T: FromStr<Err = GenerationError>>(
    env_var: &str,
    configured: &str,
) -> Result<T, GenerationError> {
    match std::env::var(env_var) {
        Ok(value) => value.parse(),
        Err(_) => configured.parse(),
    }
}

/// Install the global subscriber. `LEADGEN_LOG`, `LEADGEN_LOG_FORMAT`,
/// `LEADGEN_LOG_OUTPUT` and `LEADGEN_LOG_MODULES` win over `config`.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), GenerationError> {
    let config = config.cloned().unwrap_or_default();
    if !config.enabled {
        return Ok(());
    }

    let filter = env_filter(&config)?;
    let format: LogFormat = setting("LEADGEN_LOG_FORMAT", &config.format)?;
    let output: LogOutput = setting("LEADGEN_LOG_OUTPUT", &config.output)?;
    let ansi = config.color && output != LogOutput::File;
    let writer = match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File => BoxMakeWriter::new(std::sync::Mutex::new(open_log_file(&config.file)?)),
    };

    let registry = Registry::default().with(filter);
    let installed = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init(),
    };
    installed.map_err(|e| GenerationError::Config(format!("logger already installed: {e}")))
}

fn open_log_file(path: &Path) -> Result<File, GenerationError> {
    let io_error = |e: std::io::Error| {
        GenerationError::Config(format!("cannot open log file {}: {e}", path.display()))
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_error)
}

fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, GenerationError> {
    if let Ok(filter) = EnvFilter::try_from_env("LEADGEN_LOG") {
        return Ok(filter);
    }
    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let env_modules = std::env::var("LEADGEN_LOG_MODULES").unwrap_or_default();
    let env_pairs = env_modules
        .split(',')
        .filter_map(|spec| spec.split_once('='));
    let config_pairs = config
        .modules
        .iter()
        .map(|(module, level)| (module.as_str(), level.as_str()));

    config_pairs
        .chain(env_pairs)
        .try_fold(
            EnvFilter::new(&config.level),
            |filter, (module, level)| -> Result<EnvFilter, GenerationError> {
                Ok(filter.add_directive(module_directive(module, level)?))
            },
        )
}

fn module_directive(module: &str, level: &str) -> Result<Directive, GenerationError> {
    format!("{}={}", module.trim(), level.trim())
        .parse()
        .map_err(|e| GenerationError::Config(format!("bad log directive for {module}: {e}")))
}
