//! Session state and the read-only snapshots handed to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{GenerationRequest, SessionId};

pub const CANCELLED_REASON: &str = "generation cancelled by user";
pub const STARTING_SOURCE: &str = "starting";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    #[serde(rename = "error")]
    Errored,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Errored => "error",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Running)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub requested: u32,
    /// Candidates seen, accepted or not
    pub generated: u32,
    /// Candidates accepted
    pub valid: u32,
}

/// Consistent point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub requested: u32,
    pub generated: u32,
    pub valid: u32,
    pub percentage: u8,
    pub current_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Mutable state of one session. Only reachable through the session handle's lock.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub status: SessionStatus,
    pub counts: Counts,
    pub percentage: u8,
    pub current_source: String,
    pub last_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new(request: &GenerationRequest) -> Self {
        Self {
            status: SessionStatus::Running,
            counts: Counts {
                requested: request.target_count,
                ..Counts::default()
            },
            percentage: 0,
            current_source: STARTING_SOURCE.to_string(),
            last_error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// `round(valid / requested * 100)`, capped at 100.
    pub fn recompute_percentage(&mut self) {
        let Counts {
            requested, valid, ..
        } = self.counts;
        self.percentage = if requested == 0 {
            0
        } else {
            (f64::from(valid) / f64::from(requested) * 100.0)
                .round()
                .min(100.0) as u8
        };
    }

    pub fn target_reached(&self) -> bool {
        self.counts.valid >= self.counts.requested
    }

    pub fn snapshot(&self, session_id: &SessionId) -> ProgressSnapshot {
        ProgressSnapshot {
            session_id: session_id.clone(),
            status: self.status,
            requested: self.counts.requested,
            generated: self.counts.generated,
            valid: self.counts.valid,
            percentage: self.percentage,
            current_source: self.current_source.clone(),
            error: self.last_error.clone(),
        }
    }
}
