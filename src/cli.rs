//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to the generation service.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_event_line, format_events_text, format_section_heading, format_sessions_text,
    format_sources_text, format_summary_text,
};
pub use route::RunContext;
