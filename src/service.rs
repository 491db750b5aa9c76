//! Generation service: the process-wide entry point.
//!
//! Owns the source registry, the lead store, the single-flight slot, the table of known
//! sessions and the optional event journal. Construct once and share behind an `Arc`.

use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{error, info, warn};

use crate::config::LeadgenConfig;
use crate::error::{ExportError, GenerationError};
use crate::export::LeadRenderer;
use crate::progress::{record_session, EventJournal, EventSubscription, SessionRecord};
use crate::session::{
    new_session_id, FlightSlot, Orchestrator, ProgressSnapshot, RunSettings, SessionHandle,
};
use crate::source::{panic_message, SourceRegistry};
use crate::store::LeadStore;
use crate::types::{GenerationRequest, Lead, SessionId};

/// Service-level limits.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub run: RunSettings,
    pub max_target: u32,
    /// Finished sessions kept around for progress queries and export
    pub retained_sessions: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            run: RunSettings::default(),
            max_target: crate::config::MAX_TARGET_LIMIT,
            retained_sessions: 32,
        }
    }
}

impl From<&LeadgenConfig> for ServiceSettings {
    fn from(config: &LeadgenConfig) -> Self {
        Self {
            run: config.run_settings(),
            max_target: config.generation.max_target,
            retained_sessions: config.generation.retained_sessions,
        }
    }
}

#[derive(Default)]
struct SessionTable {
    order: VecDeque<SessionId>,
    by_id: HashMap<SessionId, Arc<SessionHandle>>,
}

impl SessionTable {
    fn insert(&mut self, handle: Arc<SessionHandle>) {
        self.order.push_back(handle.id().clone());
        self.by_id.insert(handle.id().clone(), handle);
    }

    /// Drop the oldest finished sessions beyond `keep`.
    fn prune(&mut self, keep: usize) {
        let mut finished = self
            .order
            .iter()
            .filter(|id| self.by_id.get(*id).map_or(true, |h| !h.is_running()))
            .count();
        let mut kept = VecDeque::with_capacity(self.order.len());
        while let Some(id) = self.order.pop_front() {
            let running = self.by_id.get(&id).map_or(false, |h| h.is_running());
            if !running && finished > keep {
                self.by_id.remove(&id);
                finished -= 1;
            } else {
                kept.push_back(id);
            }
        }
        self.order = kept;
    }
}

pub struct GenerationService {
    orchestrator: Orchestrator,
    flight: FlightSlot,
    sessions: RwLock<SessionTable>,
    journal: Option<Arc<EventJournal>>,
    settings: ServiceSettings,
}

impl GenerationService {
    pub fn new(
        registry: SourceRegistry,
        store: Arc<dyn LeadStore>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(Arc::new(registry), store, settings.run.clone()),
            flight: FlightSlot::new(),
            sessions: RwLock::new(SessionTable::default()),
            journal: None,
            settings,
        }
    }

    /// Attach a journal. Sessions a previous process left running are marked
    /// interrupted and old finished sessions are pruned.
    pub fn with_journal(mut self, journal: Arc<EventJournal>) -> Result<Self, GenerationError> {
        let interrupted = journal.mark_interrupted_sessions()?;
        if interrupted > 0 {
            warn!(count = interrupted, "Marked interrupted sessions from a previous run");
        }
        journal.prune_terminal(self.settings.retained_sessions)?;
        self.journal = Some(journal);
        Ok(self)
    }

    pub fn registry(&self) -> &SourceRegistry {
        self.orchestrator.registry()
    }

    pub fn journal(&self) -> Option<&Arc<EventJournal>> {
        self.journal.as_ref()
    }

    /// Start a session and return its id right away; the run continues on a spawned
    /// task. Outside a Tokio runtime this fails with `SessionFault` and records nothing.
    pub fn start(&self, request: GenerationRequest) -> Result<SessionId, GenerationError> {
        request.validate(self.settings.max_target)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| GenerationError::SessionFault(format!("no async runtime: {err}")))?;

        let session_id = new_session_id(&request.requester);
        let guard = self.flight.claim(&session_id)?;

        let handle = Arc::new(SessionHandle::new(
            session_id.clone(),
            request,
            self.flight.clone(),
        ));
        if let Some(journal) = self.journal.clone() {
            let record = SessionRecord::running(&session_id, handle.request());
            let events = handle.subscribe();
            let pending = handle.journal_pending();
            runtime.spawn(async move {
                let _pending = pending;
                record_session(journal, record, events).await;
            });
        }
        {
            let mut sessions = self.sessions.write();
            sessions.insert(Arc::clone(&handle));
            sessions.prune(self.settings.retained_sessions);
        }

        let orchestrator = self.orchestrator.clone();
        runtime.spawn(async move {
            let _guard = guard;
            let outcome = AssertUnwindSafe(orchestrator.run(Arc::clone(&handle)))
                .catch_unwind()
                .await;
            let fault = match outcome {
                Err(panic) => Some(panic_message(panic.as_ref())),
                Ok(()) if handle.is_running() => {
                    Some("run loop exited without reaching a terminal state".to_string())
                }
                Ok(()) => None,
            };
            if let Some(message) = fault {
                error!(session_id = %handle.id(), error = %message, "Generation session faulted");
                handle.fail(GenerationError::SessionFault(message).to_string());
            }
        });

        info!(session_id = %session_id, "Generation session started");
        Ok(session_id)
    }

    /// Snapshot of a known session, `None` if the id is unknown.
    pub fn progress(&self, session_id: &SessionId) -> Option<ProgressSnapshot> {
        self.handle(session_id).map(|h| h.snapshot())
    }

    pub fn cancel(&self, session_id: &SessionId) -> Result<(), GenerationError> {
        let handle = self
            .handle(session_id)
            .ok_or_else(|| GenerationError::SessionNotFound(session_id.to_string()))?;
        if !handle.cancel() {
            return Err(GenerationError::SessionTerminal(session_id.to_string()));
        }
        info!(session_id = %session_id, "Generation session cancelled");
        Ok(())
    }

    /// Ordered event stream for a session, replayed from its first event.
    pub fn subscribe(&self, session_id: &SessionId) -> Option<EventSubscription> {
        self.handle(session_id).map(|h| h.subscribe())
    }

    pub fn is_running(&self) -> bool {
        self.flight.is_occupied()
    }

    pub fn running_session(&self) -> Option<SessionId> {
        self.flight.current()
    }

    /// Snapshots of every retained session, oldest first.
    pub fn sessions(&self) -> Vec<ProgressSnapshot> {
        let sessions = self.sessions.read();
        sessions
            .order
            .iter()
            .filter_map(|id| sessions.by_id.get(id))
            .map(|h| h.snapshot())
            .collect()
    }

    /// Leads accepted by a session so far.
    pub fn session_leads(&self, session_id: &SessionId) -> Option<Vec<Lead>> {
        self.handle(session_id).map(|h| h.leads())
    }

    pub fn export_session(
        &self,
        session_id: &SessionId,
        renderer: &dyn LeadRenderer,
    ) -> Result<PathBuf, GenerationError> {
        let leads = self
            .session_leads(session_id)
            .ok_or_else(|| GenerationError::SessionNotFound(session_id.to_string()))?;
        if leads.is_empty() {
            return Err(ExportError::Empty(session_id.to_string()).into());
        }
        Ok(renderer.render(session_id, &leads)?)
    }

    /// Wait for a session to finish, and for its journal to catch up, then return the
    /// final snapshot.
    pub async fn wait(&self, session_id: &SessionId) -> Result<ProgressSnapshot, GenerationError> {
        let handle = self
            .handle(session_id)
            .ok_or_else(|| GenerationError::SessionNotFound(session_id.to_string()))?;
        handle.settled().await;
        Ok(handle.snapshot())
    }

    fn handle(&self, session_id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.sessions.read().by_id.get(session_id).cloned()
    }
}
