//! Per-session ordered event log with independent subscriber cursors.
//!
//! Every published event is appended to the log before subscribers are woken, so all
//! subscribers observe the same order, and a subscriber that joins late replays the
//! session from its first event.

use std::sync::Arc;

use chrono::Utc;
use futures::Stream;
use parking_lot::RwLock;
use tokio::sync::watch;

use crate::progress::event::{EventEnvelope, GenerationEvent};
use crate::types::SessionId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LogState {
    len: usize,
    closed: bool,
}

struct ChannelInner {
    session_id: SessionId,
    log: RwLock<Vec<EventEnvelope>>,
    state: watch::Sender<LogState>,
}

/// Producer side, owned by the session. Cloning shares the same log.
#[derive(Clone)]
pub struct EventChannel {
    inner: Arc<ChannelInner>,
}

impl EventChannel {
    pub fn new(session_id: SessionId) -> Self {
        let (state, _) = watch::channel(LogState::default());
        Self {
            inner: Arc::new(ChannelInner {
                session_id,
                log: RwLock::new(Vec::new()),
                state,
            }),
        }
    }

    /// Append an event and wake subscribers. Returns `None` once the channel is closed.
    pub fn publish(&self, event: GenerationEvent) -> Option<EventEnvelope> {
        let mut log = self.inner.log.write();
        if self.inner.state.borrow().closed {
            return None;
        }
        let envelope = EventEnvelope {
            session_id: self.inner.session_id.clone(),
            seq: log.len() as u64 + 1,
            ts: Utc::now(),
            event,
        };
        log.push(envelope.clone());
        let len = log.len();
        self.inner.state.send_modify(|state| state.len = len);
        Some(envelope)
    }

    /// Mark the log complete. Subscribers end after draining what was published.
    pub fn close(&self) {
        let _log = self.inner.log.write();
        self.inner.state.send_modify(|state| state.closed = true);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.borrow().closed
    }

    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            inner: Arc::clone(&self.inner),
            state: self.inner.state.subscribe(),
            cursor: 0,
        }
    }

    /// Copy of every event published so far.
    pub fn events(&self) -> Vec<EventEnvelope> {
        self.inner.log.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.log.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consumer side. Reads the session log from the start, in order.
pub struct EventSubscription {
    inner: Arc<ChannelInner>,
    state: watch::Receiver<LogState>,
    cursor: usize,
}

impl EventSubscription {
    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    /// Next event, waiting for one if necessary. `None` once the session has finished
    /// and every event has been delivered.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        loop {
            let state = *self.state.borrow_and_update();
            if self.cursor < state.len {
                let event = self.inner.log.read().get(self.cursor).cloned();
                self.cursor += 1;
                return event;
            }
            if state.closed {
                return None;
            }
            if self.state.changed().await.is_err() {
                return None;
            }
        }
    }

    /// Already-published events not yet consumed, without waiting.
    pub fn drain_ready(&mut self) -> Vec<EventEnvelope> {
        let log = self.inner.log.read();
        let ready: Vec<EventEnvelope> = log[self.cursor.min(log.len())..].to_vec();
        self.cursor = log.len();
        ready
    }

    pub fn into_stream(self) -> impl Stream<Item = EventEnvelope> + Send {
        futures::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|event| (event, sub))
        })
    }
}
