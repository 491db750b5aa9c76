//! Progress observability: event schema, per-session channels and the durable journal.

pub mod channel;
pub mod event;
pub mod journal;

pub use channel::{EventChannel, EventSubscription};
pub use event::{EventEnvelope, GenerationEvent};
pub use journal::{record_session, EventJournal, RecordStatus, SessionRecord};
