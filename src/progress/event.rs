//! Event schema for generation progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::ProgressSnapshot;
use crate::types::{Lead, SessionId};

/// One observable step of a generation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationEvent {
    Progress(ProgressSnapshot),
    Batch { batch_number: u32, leads: Vec<Lead> },
    Completed { total_valid: u32 },
    Error { message: String },
}

impl GenerationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationEvent::Progress(_) => "progress",
            GenerationEvent::Batch { .. } => "batch",
            GenerationEvent::Completed { .. } => "completed",
            GenerationEvent::Error { .. } => "error",
        }
    }
}

/// An event as delivered to subscribers: session id, per-session sequence number
/// (starting at 1) and the time it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub session_id: SessionId,
    pub seq: u64,
    pub ts: DateTime<Utc>,
    pub event: GenerationEvent,
}
