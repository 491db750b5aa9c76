//! leadgen: single-flight lead generation orchestrator
//!
//! Queries a fixed, ordered set of sources for candidate businesses, validates,
//! deduplicates and scores them into leads, persists the leads and publishes an ordered
//! stream of progress, batch, completion and error events per session.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod progress;
pub mod service;
pub mod session;
pub mod source;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{ExportError, GenerationError, SourceError, StoreError};
pub use progress::{EventEnvelope, EventSubscription, GenerationEvent};
pub use service::{GenerationService, ServiceSettings};
pub use session::{ProgressSnapshot, SessionStatus};
pub use types::{GenerationRequest, Lead, RawCandidate, SessionId, SourceId};
