//! CLI route: single route table and run context. Dispatches to the generation service
//! and presentation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::batch::Batch;
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_event_line, format_events_text, format_sessions_text, format_sources_text,
    format_summary_text,
};
use crate::config::{ConfigLoader, LeadgenConfig, StorageConfig};
use crate::error::{GenerationError, StoreError};
use crate::export::{cleanup_older_than, CsvExporter};
use crate::progress::{EventJournal, GenerationEvent};
use crate::service::{GenerationService, ServiceSettings};
use crate::store::SledLeadStore;
use crate::types::GenerationRequest;

/// Runtime context for CLI execution: workspace, loaded configuration and resolved
/// storage paths. Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: LeadgenConfig,
    storage: StorageConfig,
}

impl RunContext {
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
    ) -> Result<Self, GenerationError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::with_config(workspace_root, config)
    }

    pub fn with_config(
        workspace_root: PathBuf,
        config: LeadgenConfig,
    ) -> Result<Self, GenerationError> {
        config.ensure_valid()?;
        let workspace_root = dunce::canonicalize(&workspace_root).unwrap_or(workspace_root);
        let storage = config.storage.resolved(&workspace_root);
        Ok(Self {
            workspace_root,
            config,
            storage,
        })
    }

    pub fn config(&self) -> &LeadgenConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, GenerationError> {
        info!(command = command.name(), "Executing command");
        match command {
            Commands::Generate {
                niche,
                city,
                country,
                count,
                requester,
                format,
                export,
            } => {
                let country = country
                    .clone()
                    .unwrap_or_else(|| self.config.generation.default_country.clone());
                let request =
                    GenerationRequest::new(niche.as_str(), city.as_str(), *count, requester.as_str())
                        .with_country(country);
                self.handle_generate(request, *format, *export)
            }
            Commands::Sources { format } => self.handle_sources(*format),
            Commands::Sessions { format } => self.handle_sessions(*format),
            Commands::Events { session, format } => self.handle_events(session, *format),
            Commands::Cleanup { older_than_hours } => self.handle_cleanup(*older_than_hours),
        }
    }

    fn handle_generate(
        &self,
        request: GenerationRequest,
        format: OutputFormat,
        export: bool,
    ) -> Result<String, GenerationError> {
        let registry = self.config.build_registry(&self.workspace_root)?;
        if registry.is_empty() {
            return Err(GenerationError::Config(
                "No sources configured; add [[sources]] entries to the configuration".to_string(),
            ));
        }

        let store = Arc::new(SledLeadStore::open(&self.storage.store_path)?);
        let journal = Arc::new(self.open_journal()?);
        let service = GenerationService::new(
            registry,
            store.clone(),
            ServiceSettings::from(&self.config),
        )
        .with_journal(journal)?;
        let exporter = CsvExporter::new(&self.storage.export_dir);

        let runtime = tokio::runtime::Runtime::new().map_err(|e| {
            GenerationError::SessionFault(format!("Failed to create async runtime: {}", e))
        })?;

        let (snapshot, lines, mut exports) = runtime.block_on(async {
            let session_id = service.start(request)?;
            let mut subscription = service
                .subscribe(&session_id)
                .ok_or_else(|| GenerationError::SessionNotFound(session_id.to_string()))?;

            let mut lines = Vec::new();
            let mut exports = Vec::new();
            while let Some(envelope) = subscription.next().await {
                match format {
                    OutputFormat::Text => eprintln!("{}", format_event_line(&envelope)),
                    OutputFormat::Json => lines.push(
                        serde_json::to_string(&envelope).map_err(StoreError::from)?,
                    ),
                }
                if !export {
                    continue;
                }
                if let GenerationEvent::Batch { batch_number, leads } = &envelope.event {
                    let batch = Batch {
                        number: *batch_number,
                        leads: leads.clone(),
                    };
                    match exporter.render_batch(&session_id, &batch) {
                        Ok(path) => exports.push(path.display().to_string()),
                        Err(err) => warn!(error = %err, "Failed to export batch"),
                    }
                }
            }
            let snapshot = service.wait(&session_id).await?;
            Ok::<_, GenerationError>((snapshot, lines, exports))
        })?;

        if export && snapshot.valid > 0 {
            let path = service.export_session(&snapshot.session_id, &exporter)?;
            exports.push(path.display().to_string());
        }
        store.flush()?;

        match format {
            OutputFormat::Text => Ok(format_summary_text(&snapshot, &exports)),
            OutputFormat::Json => Ok(lines.join("\n")),
        }
    }

    fn handle_sources(&self, format: OutputFormat) -> Result<String, GenerationError> {
        match format {
            OutputFormat::Text => Ok(format_sources_text(&self.config.sources)),
            OutputFormat::Json => to_json(&self.config.sources),
        }
    }

    fn handle_sessions(&self, format: OutputFormat) -> Result<String, GenerationError> {
        let records = self.open_journal()?.list_sessions()?;
        match format {
            OutputFormat::Text => Ok(format_sessions_text(&records)),
            OutputFormat::Json => to_json(&records),
        }
    }

    fn handle_events(
        &self,
        session: &str,
        format: OutputFormat,
    ) -> Result<String, GenerationError> {
        let journal = self.open_journal()?;
        if journal.get_session(session)?.is_none() {
            return Err(GenerationError::SessionNotFound(session.to_string()));
        }
        let events = journal.read_events(session)?;
        match format {
            OutputFormat::Text => Ok(format_events_text(session, &events)),
            OutputFormat::Json => to_json(&events),
        }
    }

    fn handle_cleanup(&self, older_than_hours: Option<u64>) -> Result<String, GenerationError> {
        let hours = older_than_hours.unwrap_or(self.config.storage.export_retention_hours);
        let removed = cleanup_older_than(
            &self.storage.export_dir,
            Duration::from_secs(hours.saturating_mul(3600)),
        )?;
        Ok(format!(
            "Removed {} export file(s) older than {}h from {}",
            removed,
            hours,
            self.storage.export_dir.display()
        ))
    }

    fn open_journal(&self) -> Result<EventJournal, GenerationError> {
        Ok(EventJournal::open(&self.storage.journal_path)?)
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, GenerationError> {
    serde_json::to_string_pretty(value).map_err(|e| GenerationError::Storage(e.into()))
}
