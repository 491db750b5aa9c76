//! Shared handle to one generation session.
//!
//! The run loop mutates the session through this handle; callers read snapshots from it.
//! Every state change that produces an event happens under the state lock together with
//! the emission, so the event log order always matches the order of state changes and a
//! snapshot never runs ahead of, or behind, a terminal status. Only in-memory work happens
//! under the lock; the journal follows the event log from its own task.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::batch::Batch;
use crate::progress::{EventChannel, EventSubscription, GenerationEvent};
use crate::session::flight::FlightSlot;
use crate::session::state::{ProgressSnapshot, SessionState, SessionStatus, CANCELLED_REASON};
use crate::types::{GenerationRequest, Lead, SessionId, SourceId};

pub struct SessionHandle {
    id: SessionId,
    request: GenerationRequest,
    state: Mutex<SessionState>,
    leads: Mutex<Vec<Lead>>,
    channel: EventChannel,
    cancel: watch::Sender<bool>,
    finished: watch::Sender<bool>,
    journaled: watch::Sender<bool>,
    flight: FlightSlot,
}

/// Held by the journal writer; the session counts as settled once it drops.
pub struct JournalPending {
    handle: Arc<SessionHandle>,
}

impl Drop for JournalPending {
    fn drop(&mut self) {
        self.handle.journaled.send_replace(true);
    }
}

impl SessionHandle {
    pub fn new(id: SessionId, request: GenerationRequest, flight: FlightSlot) -> Self {
        let state = SessionState::new(&request);
        let (cancel, _) = watch::channel(false);
        let (finished, _) = watch::channel(false);
        let (journaled, _) = watch::channel(true);

        Self {
            channel: EventChannel::new(id.clone()),
            id,
            request,
            state: Mutex::new(state),
            leads: Mutex::new(Vec::new()),
            cancel,
            finished,
            journaled,
            flight,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state.lock().snapshot(&self.id)
    }

    pub fn status(&self) -> SessionStatus {
        self.state.lock().status
    }

    pub fn is_running(&self) -> bool {
        self.status() == SessionStatus::Running
    }

    /// Accepted leads so far, in acceptance order.
    pub fn leads(&self) -> Vec<Lead> {
        self.leads.lock().clone()
    }

    pub fn subscribe(&self) -> EventSubscription {
        self.channel.subscribe()
    }

    pub fn cancel_signal(&self) -> watch::Receiver<bool> {
        self.cancel.subscribe()
    }

    /// Resolves once the session reaches a terminal status.
    pub async fn finished(&self) {
        let mut rx = self.finished.subscribe();
        let _ = rx.wait_for(|done| *done).await;
    }

    /// Mark the journal as behind until the returned guard drops.
    pub fn journal_pending(self: &Arc<Self>) -> JournalPending {
        self.journaled.send_replace(false);
        JournalPending {
            handle: Arc::clone(self),
        }
    }

    /// Resolves once the session is terminal and its journal writer is done.
    pub async fn settled(&self) {
        self.finished().await;
        let mut rx = self.journaled.subscribe();
        let _ = rx.wait_for(|done| *done).await;
    }

    /// Valid leads still needed to reach the target.
    pub fn remaining(&self) -> u32 {
        let state = self.state.lock();
        state.counts.requested.saturating_sub(state.counts.valid)
    }

    pub fn target_reached(&self) -> bool {
        self.state.lock().target_reached()
    }

    /// Switch to `source` and announce it. Returns `false` if the session is no longer running.
    pub fn enter_source(&self, source: &SourceId) -> bool {
        let mut state = self.state.lock();
        if state.status != SessionStatus::Running {
            return false;
        }
        state.current_source = source.to_string();
        self.emit_progress(&state);
        true
    }

    /// Count a rejected candidate. Returns `false` if the session is no longer running.
    pub fn record_rejected(&self) -> bool {
        let mut state = self.state.lock();
        if state.status != SessionStatus::Running {
            return false;
        }
        state.counts.generated += 1;
        state.recompute_percentage();
        self.emit_progress(&state);
        true
    }

    /// Count an accepted lead, keep it for export and emit `batch` (when one filled up)
    /// followed by `progress`. Returns `false`, recording nothing, if the session is no
    /// longer running.
    pub fn record_accepted(&self, lead: &Lead, batch: Option<Batch>) -> bool {
        let mut state = self.state.lock();
        if state.status != SessionStatus::Running {
            return false;
        }
        state.counts.generated += 1;
        state.counts.valid += 1;
        state.recompute_percentage();
        self.leads.lock().push(lead.clone());
        if let Some(batch) = batch {
            self.emit(GenerationEvent::Batch {
                batch_number: batch.number,
                leads: batch.leads,
            });
        }
        self.emit_progress(&state);
        true
    }

    /// Normal end of the run: optional trailing batch, then `progress` (100%) and `completed`.
    pub fn complete(&self, trailing: Option<Batch>) -> bool {
        let mut state = self.state.lock();
        if state.status != SessionStatus::Running {
            return false;
        }
        if let Some(batch) = trailing {
            self.emit(GenerationEvent::Batch {
                batch_number: batch.number,
                leads: batch.leads,
            });
        }
        state.percentage = 100;
        self.terminate(&mut state, SessionStatus::Completed, None);
        self.emit_progress(&state);
        self.emit(GenerationEvent::Completed {
            total_valid: state.counts.valid,
        });
        self.seal();
        true
    }

    /// Abort with an internal fault: `progress` then `error`.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        let mut state = self.state.lock();
        if state.status != SessionStatus::Running {
            return false;
        }
        self.terminate(&mut state, SessionStatus::Errored, Some(message.clone()));
        self.emit_progress(&state);
        self.emit(GenerationEvent::Error { message });
        self.seal();
        true
    }

    /// Cooperative cancellation: the session turns terminal now, the run loop stops at
    /// its next checkpoint.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        if state.status != SessionStatus::Running {
            return false;
        }
        self.terminate(
            &mut state,
            SessionStatus::Cancelled,
            Some(CANCELLED_REASON.to_string()),
        );
        self.emit_progress(&state);
        self.emit(GenerationEvent::Error {
            message: CANCELLED_REASON.to_string(),
        });
        self.seal();
        self.cancel.send_replace(true);
        true
    }

    // Status change and slot release happen before the terminal events are published,
    // so an observer of `completed`/`error` can start the next session right away.
    fn terminate(&self, state: &mut SessionState, status: SessionStatus, error: Option<String>) {
        state.status = status;
        state.last_error = error;
        state.finished_at = Some(Utc::now());
        self.flight.release(&self.id);
    }

    fn seal(&self) {
        self.channel.close();
        self.finished.send_replace(true);
    }

    fn emit_progress(&self, state: &SessionState) {
        self.emit(GenerationEvent::Progress(state.snapshot(&self.id)));
    }

    fn emit(&self, event: GenerationEvent) {
        self.channel.publish(event);
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
