//! Durable sled-backed journal of generation sessions and their events.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::progress::channel::EventSubscription;
use crate::progress::event::{EventEnvelope, GenerationEvent};
use crate::session::{now_millis, ProgressSnapshot, SessionStatus};
use crate::types::{GenerationRequest, SessionId};

const TREE_SESSIONS: &str = "gen_sessions";
const TREE_EVENTS: &str = "gen_events";
const EVENT_KEY_PAD: usize = 20;

/// Session status as recorded in the journal. `Interrupted` marks sessions that were
/// still running when their process went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Running,
    Completed,
    Error,
    Cancelled,
    Interrupted,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Running => "running",
            RecordStatus::Completed => "completed",
            RecordStatus::Error => "error",
            RecordStatus::Cancelled => "cancelled",
            RecordStatus::Interrupted => "interrupted",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, RecordStatus::Running)
    }
}

impl From<SessionStatus> for RecordStatus {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Running => RecordStatus::Running,
            SessionStatus::Completed => RecordStatus::Completed,
            SessionStatus::Errored => RecordStatus::Error,
            SessionStatus::Cancelled => RecordStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub request: GenerationRequest,
    pub started_at_ms: u64,
    pub ended_at_ms: Option<u64>,
    pub status: RecordStatus,
    pub valid: u32,
    pub error: Option<String>,
}

impl SessionRecord {
    pub fn running(session_id: &SessionId, request: &GenerationRequest) -> Self {
        Self {
            session_id: session_id.to_string(),
            request: request.clone(),
            started_at_ms: now_millis(),
            ended_at_ms: None,
            status: RecordStatus::Running,
            valid: 0,
            error: None,
        }
    }
}

#[derive(Clone)]
pub struct EventJournal {
    db: Db,
    sessions: Tree,
    events: Tree,
}

impl EventJournal {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::new(sled::open(path)?)
    }

    pub fn new(db: Db) -> Result<Self, StoreError> {
        let sessions = db.open_tree(TREE_SESSIONS)?;
        let events = db.open_tree(TREE_EVENTS)?;
        Ok(Self {
            db,
            sessions,
            events,
        })
    }

    pub fn shared(db: Db) -> Result<Arc<Self>, StoreError> {
        Ok(Arc::new(Self::new(db)?))
    }

    pub fn put_session(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let value = serde_json::to_vec(record)?;
        self.sessions.insert(record.session_id.as_bytes(), value)?;
        Ok(())
    }

    pub fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let Some(raw) = self.sessions.get(session_id.as_bytes())? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    /// All sessions, newest first.
    pub fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let mut out = Vec::new();
        for result in self.sessions.iter() {
            let (_, value) = result?;
            let rec: SessionRecord = serde_json::from_slice(&value)?;
            out.push(rec);
        }
        out.sort_by_key(|s| std::cmp::Reverse(s.started_at_ms));
        Ok(out)
    }

    /// Record the terminal state of a session.
    pub fn finish_session(
        &self,
        session_id: &str,
        status: RecordStatus,
        valid: u32,
        error: Option<String>,
    ) -> Result<(), StoreError> {
        let Some(mut record) = self.get_session(session_id)? else {
            return Err(StoreError::Database(format!(
                "session record missing: {session_id}"
            )));
        };
        record.status = status;
        record.valid = valid;
        record.error = error;
        record.ended_at_ms = Some(now_millis());
        self.put_session(&record)
    }

    pub fn append_event(&self, event: &EventEnvelope) -> Result<(), StoreError> {
        let key = encode_event_key(event.session_id.as_str(), event.seq);
        let value = serde_json::to_vec(event)?;
        self.events.insert(key.as_bytes(), value)?;
        Ok(())
    }

    pub fn read_events(&self, session_id: &str) -> Result<Vec<EventEnvelope>, StoreError> {
        self.read_events_after(session_id, 0)
    }

    pub fn read_events_after(
        &self,
        session_id: &str,
        after_seq: u64,
    ) -> Result<Vec<EventEnvelope>, StoreError> {
        let prefix = format!("{session_id}:");
        let mut out = Vec::new();
        for result in self.events.scan_prefix(prefix.as_bytes()) {
            let (_, value) = result?;
            let parsed: EventEnvelope = serde_json::from_slice(&value)?;
            if parsed.seq > after_seq {
                out.push(parsed);
            }
        }
        out.sort_by_key(|e| e.seq);
        Ok(out)
    }

    /// Sessions still `running` belong to a process that is gone; mark them interrupted.
    pub fn mark_interrupted_sessions(&self) -> Result<usize, StoreError> {
        let mut changed = 0usize;
        for mut session in self.list_sessions()? {
            if session.status == RecordStatus::Running {
                session.status = RecordStatus::Interrupted;
                session.ended_at_ms = Some(now_millis());
                self.put_session(&session)?;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Keep the `max_terminal` newest finished sessions, deleting older ones with their events.
    pub fn prune_terminal(&self, max_terminal: usize) -> Result<usize, StoreError> {
        let finished: Vec<SessionRecord> = self
            .list_sessions()?
            .into_iter()
            .filter(|s| s.status.is_terminal())
            .collect();
        let mut removed = 0usize;
        for session in finished.iter().skip(max_terminal) {
            self.delete_session(&session.session_id)?;
            removed += 1;
        }
        Ok(removed)
    }

    pub fn delete_session(&self, session_id: &str) -> Result<(), StoreError> {
        self.sessions.remove(session_id.as_bytes())?;
        let prefix = format!("{session_id}:");
        let keys: Vec<Vec<u8>> = self
            .events
            .scan_prefix(prefix.as_bytes())
            .filter_map(|r| r.ok().map(|(k, _)| k.to_vec()))
            .collect();
        for key in keys {
            self.events.remove(key)?;
        }
        Ok(())
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn encode_event_key(session_id: &str, seq: u64) -> String {
        encode_event_key(session_id, seq)
    }
}

fn encode_event_key(session_id: &str, seq: u64) -> String {
    format!("{session_id}:{seq:0width$}", width = EVENT_KEY_PAD)
}

/// Journal one session from its event subscription.
///
/// Writes the `running` record, then appends events in sequence order as they are
/// published. Once the channel closes, the final progress snapshot becomes the terminal
/// record and the journal is flushed. Every sled call runs on the blocking pool, so the
/// session itself never waits on disk.
pub async fn record_session(
    journal: Arc<EventJournal>,
    record: SessionRecord,
    mut events: EventSubscription,
) {
    let session_id = record.session_id.clone();
    let writer = Arc::clone(&journal);
    if let Err(err) = blocking(move || writer.put_session(&record)).await {
        warn!(session_id = %session_id, error = %err, "Failed to journal session start");
    }

    let mut last_progress: Option<ProgressSnapshot> = None;
    while let Some(first) = events.next().await {
        let mut pending = vec![first];
        pending.extend(events.drain_ready());
        if let Some(progress) = pending.iter().rev().find_map(|e| match &e.event {
            GenerationEvent::Progress(p) => Some(p.clone()),
            _ => None,
        }) {
            last_progress = Some(progress);
        }

        let writer = Arc::clone(&journal);
        let count = pending.len();
        let result = blocking(move || pending.iter().try_for_each(|e| writer.append_event(e))).await;
        match result {
            Ok(()) => debug!(session_id = %session_id, count, "Journaled events"),
            Err(err) => warn!(session_id = %session_id, error = %err, "Failed to journal events"),
        }
    }

    let Some(last) = last_progress.filter(|p| p.status != SessionStatus::Running) else {
        warn!(session_id = %session_id, "Event stream ended without a terminal snapshot");
        return;
    };
    let id = session_id.clone();
    let result = blocking(move || {
        journal.finish_session(&id, last.status.into(), last.valid, last.error)?;
        journal.flush()
    })
    .await;
    if let Err(err) = result {
        warn!(session_id = %session_id, error = %err, "Failed to journal session end");
    }
}

async fn blocking<F>(work: F) -> Result<(), StoreError>
where
    F: FnOnce() -> Result<(), StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| StoreError::Database(format!("journal task failed: {err}")))?
}
