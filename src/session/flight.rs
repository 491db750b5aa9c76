//! Process-wide single-flight slot: at most one session runs at a time.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::GenerationError;
use crate::types::SessionId;

/// Holds the id of the running session, if any. Claiming and releasing are atomic
/// with respect to each other.
#[derive(Debug, Clone, Default)]
pub struct FlightSlot {
    active: Arc<Mutex<Option<SessionId>>>,
}

impl FlightSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `id`, or fail with `Conflict` naming the running session.
    pub fn claim(&self, id: &SessionId) -> Result<FlightGuard, GenerationError> {
        let mut active = self.active.lock();
        if let Some(running) = active.as_ref() {
            return Err(GenerationError::Conflict(running.to_string()));
        }
        *active = Some(id.clone());
        Ok(FlightGuard {
            slot: self.clone(),
            id: id.clone(),
        })
    }

    /// Release the slot if `id` still holds it. Returns whether anything was released.
    pub fn release(&self, id: &SessionId) -> bool {
        let mut active = self.active.lock();
        if active.as_ref() == Some(id) {
            *active = None;
            return true;
        }
        false
    }

    pub fn current(&self) -> Option<SessionId> {
        self.active.lock().clone()
    }

    pub fn is_occupied(&self) -> bool {
        self.active.lock().is_some()
    }
}

/// Releases its claim on drop, so the slot frees up even if the run task unwinds.
#[derive(Debug)]
pub struct FlightGuard {
    slot: FlightSlot,
    id: SessionId,
}

impl FlightGuard {
    pub fn session_id(&self) -> &SessionId {
        &self.id
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.slot.release(&self.id);
    }
}
