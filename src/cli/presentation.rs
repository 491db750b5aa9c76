//! CLI presentation: text formatters for sources, sessions, events and run summaries.

use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

use crate::progress::{EventEnvelope, GenerationEvent, SessionRecord};
use crate::session::{ProgressSnapshot, SessionStatus};
use crate::source::SourceConfig;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_sources_text(sources: &[SourceConfig]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Sources")));
    if sources.is_empty() {
        out.push_str("No sources configured.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Source", "Fixture", "Limit factor"]);
    for (i, source) in sources.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            source.id.clone(),
            source.fixture.display().to_string(),
            source
                .limit_factor
                .map(|f| f.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_sessions_text(records: &[SessionRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Sessions")));
    if records.is_empty() {
        out.push_str("No sessions recorded.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Session", "Niche", "City", "Status", "Valid", "Target"]);
    for record in records {
        table.add_row(vec![
            record.session_id.clone(),
            record.request.niche.clone(),
            record.request.city.clone(),
            record.status.as_str().to_string(),
            record.valid.to_string(),
            record.request.target_count.to_string(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// One line per event, as printed while a session runs.
pub fn format_event_line(envelope: &EventEnvelope) -> String {
    match &envelope.event {
        GenerationEvent::Progress(snap) => format!(
            "[{:>3}%] {} valid {}/{} (seen {}) via {}",
            snap.percentage,
            status_label(snap.status),
            snap.valid,
            snap.requested,
            snap.generated,
            snap.current_source
        ),
        GenerationEvent::Batch {
            batch_number,
            leads,
        } => format!("batch #{} ready: {} lead(s)", batch_number, leads.len()),
        GenerationEvent::Completed { total_valid } => {
            format!("{} {} valid lead(s)", "completed:".green(), total_valid)
        }
        GenerationEvent::Error { message } => format!("{} {}", "error:".red(), message),
    }
}

pub fn format_events_text(session_id: &str, events: &[EventEnvelope]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Events for {}", session_id))
    ));
    if events.is_empty() {
        out.push_str("No events recorded.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Seq", "Time", "Type", "Details"]);
    for envelope in events {
        table.add_row(vec![
            envelope.seq.to_string(),
            envelope.ts.format("%H:%M:%S%.3f").to_string(),
            envelope.event.kind().to_string(),
            format_event_line(envelope),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// Final summary of a generate run.
pub fn format_summary_text(snapshot: &ProgressSnapshot, exports: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Generation")));
    out.push_str(&format!("  Session: {}\n", snapshot.session_id));
    out.push_str(&format!("  Status: {}\n", status_label(snapshot.status)));
    out.push_str(&format!(
        "  Valid leads: {}/{}\n",
        snapshot.valid, snapshot.requested
    ));
    out.push_str(&format!("  Candidates seen: {}\n", snapshot.generated));
    if let Some(ref error) = snapshot.error {
        out.push_str(&format!("  Error: {}\n", error));
    }
    if !exports.is_empty() {
        out.push_str("\n  Exports:\n");
        for path in exports {
            out.push_str(&format!("    {}\n", path));
        }
    }
    out
}

fn status_label(status: SessionStatus) -> String {
    match status {
        SessionStatus::Running => status.as_str().yellow().to_string(),
        SessionStatus::Completed => status.as_str().green().to_string(),
        SessionStatus::Errored | SessionStatus::Cancelled => status.as_str().red().to_string(),
    }
}
