//! CLI parse: clap types for leadgen. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// leadgen - run lead generation sessions against configured sources
#[derive(Parser)]
#[command(name = "leadgen")]
#[command(about = "Generate validated, deduplicated and scored leads from configured sources")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one generation session and stream its events
    Generate {
        /// Business niche, e.g. "petshop"
        #[arg(long)]
        niche: String,
        /// City to search in
        #[arg(long)]
        city: String,
        /// Country (defaults to generation.default_country)
        #[arg(long)]
        country: Option<String>,
        /// Number of valid leads wanted
        #[arg(long)]
        count: u32,
        /// Requester identity recorded with the session
        #[arg(long, default_value = "cli")]
        requester: String,
        /// Output format (text or json)
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Write each batch and the whole session to CSV
        #[arg(long)]
        export: bool,
    },
    /// List configured sources in query order
    Sources {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List journaled sessions, newest first
    Sessions {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show the journaled events of a session
    Events {
        /// Session id
        #[arg(long)]
        session: String,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Delete CSV exports older than the retention window
    Cleanup {
        /// Retention in hours (defaults to storage.export_retention_hours)
        #[arg(long)]
        older_than_hours: Option<u64>,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Generate { .. } => "generate",
            Commands::Sources { .. } => "sources",
            Commands::Sessions { .. } => "sessions",
            Commands::Events { .. } => "events",
            Commands::Cleanup { .. } => "cleanup",
        }
    }
}
