//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::GenerationError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &GenerationError) -> String {
    match e {
        GenerationError::Conflict(running) => {
            format!("Another generation is already running ({running}); try again when it finishes")
        }
        other => other.to_string(),
    }
}
