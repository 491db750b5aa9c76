//! Generation sessions: state, identity, single-flight slot and the orchestrating run loop.

mod flight;
mod handle;
mod id;
mod orchestrator;
mod state;

pub use flight::{FlightGuard, FlightSlot};
pub use handle::{JournalPending, SessionHandle};
pub use id::{new_session_id, now_millis};
pub use orchestrator::{Orchestrator, RunSettings};
pub use state::{Counts, ProgressSnapshot, SessionState, SessionStatus, CANCELLED_REASON};
