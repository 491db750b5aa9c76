//! leadgen CLI Binary
//!
//! Command-line interface for the lead generation service.

use clap::Parser;
use leadgen::cli::{map_error, Cli, RunContext};
use leadgen::config::{ConfigLoader, LeadgenConfig};
use leadgen::logging::{init_logging, LoggingConfig};
use leadgen::GenerationError;
use std::process::ExitCode;
use tracing::{debug, error};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load once: the same layered config drives logging and the run context.
    let loaded = load_config(&cli);
    let logging = logging_config(&cli, loaded.as_ref().ok());
    if let Err(e) = init_logging(Some(&logging)) {
        eprintln!("leadgen: {e}");
        return ExitCode::FAILURE;
    }

    let result = loaded
        .and_then(|config| RunContext::with_config(cli.workspace.clone(), config))
        .and_then(|ctx| ctx.execute(&cli.command));

    match result {
        Ok(output) => {
            debug!(command = cli.command.name(), "Command finished");
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(command = cli.command.name(), error = %e, "Command failed");
            eprintln!("leadgen: {}", map_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<LeadgenConfig, GenerationError> {
    let config = match cli.config.as_deref() {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load(&cli.workspace)?,
    };
    Ok(config)
}

/// Flags beat the `[logging]` section, which beats the defaults.
fn logging_config(cli: &Cli, config: Option<&LeadgenConfig>) -> LoggingConfig {
    let mut logging = config.map(|c| c.logging.clone()).unwrap_or_default();

    if cli.verbose {
        logging.level = "debug".to_string();
    }
    for (flag, slot) in [
        (&cli.log_level, &mut logging.level),
        (&cli.log_format, &mut logging.format),
        (&cli.log_output, &mut logging.output),
    ] {
        if let Some(value) = flag {
            *slot = value.clone();
        }
    }
    if logging.file.is_relative() {
        logging.file = cli.workspace.join(&logging.file);
    }
    logging
}
