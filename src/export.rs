//! CSV export of session leads.
//!
//! Rendering is a pure transformation from leads to a file and is never invoked from the
//! run loop; callers export a finished (or running) session on demand.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::batch::Batch;
use crate::error::ExportError;
use crate::session::now_millis;
use crate::types::{Lead, SessionId};

pub const CSV_HEADER: [&str; 10] = [
    "Name", "Phone", "Email", "Website", "Source", "City", "Niche", "Country", "Score",
    "Timestamp",
];

/// Turns a set of leads into a file and returns its path.
pub trait LeadRenderer: Send + Sync {
    fn render(&self, session_id: &SessionId, leads: &[Lead]) -> Result<PathBuf, ExportError>;
}

/// Writes CSV files into one export directory.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Export a single batch as it arrives.
    pub fn render_batch(
        &self,
        session_id: &SessionId,
        batch: &Batch,
    ) -> Result<PathBuf, ExportError> {
        let name = format!(
            "leads_batch_{}_{}_{}.csv",
            session_id,
            batch.number,
            now_millis()
        );
        self.write(session_id, &name, &batch.leads)
    }

    fn write(
        &self,
        session_id: &SessionId,
        file_name: &str,
        leads: &[Lead],
    ) -> Result<PathBuf, ExportError> {
        if leads.is_empty() {
            return Err(ExportError::Empty(session_id.to_string()));
        }
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(CSV_HEADER)?;
        for lead in leads {
            writer.write_record(lead_record(lead))?;
        }
        writer.flush()?;

        debug!(path = %path.display(), rows = leads.len(), "Wrote CSV export");
        Ok(path)
    }
}

impl LeadRenderer for CsvExporter {
    fn render(&self, session_id: &SessionId, leads: &[Lead]) -> Result<PathBuf, ExportError> {
        let name = format!("leads_complete_{}_{}.csv", session_id, now_millis());
        self.write(session_id, &name, leads)
    }
}

fn lead_record(lead: &Lead) -> [String; 10] {
    [
        lead.name.clone(),
        lead.phone.clone().unwrap_or_default(),
        lead.email.clone().unwrap_or_default(),
        lead.website.clone().unwrap_or_default(),
        lead.source.to_string(),
        lead.city.clone(),
        lead.niche.clone(),
        lead.country.clone(),
        lead.score.to_string(),
        lead.created_at.to_rfc3339(),
    ]
}

/// Delete `.csv` files directly under `dir` last modified more than `max_age` ago.
/// Returns how many were removed. A missing directory has nothing to clean.
pub fn cleanup_older_than(dir: &Path, max_age: Duration) -> Result<usize, ExportError> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ExportError::Io(e.into()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("csv")
        {
            continue;
        }
        let age = entry
            .metadata()
            .map_err(|e| ExportError::Io(e.into()))?
            .modified()?
            .elapsed()
            .unwrap_or_default();
        if age >= max_age {
            match fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(err) => warn!(path = %path.display(), error = %err, "Failed to remove export"),
            }
        }
    }
    Ok(removed)
}
