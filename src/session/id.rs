//! Session identity helpers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::SessionId;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// `session_{millis}_{requester}_{seq}`; the process-wide counter keeps ids unique even
/// for the same requester within one millisecond.
pub fn new_session_id(requester: &str) -> SessionId {
    let ts = now_millis();
    let seq = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    let requester: String = requester
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();
    SessionId::new(format!("session_{ts}_{requester}_{seq}"))
}
