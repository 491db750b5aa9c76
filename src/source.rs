//! Source adapters
//!
//! A source adapter is an opaque producer of [`RawCandidate`]s for a query. Adapters are
//! registered once, in a fixed order, in a [`SourceRegistry`] shared by every session.
//! The orchestrator calls them one at a time through [`scrape_guarded`], which turns a
//! panicking adapter into an ordinary [`SourceError`].

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use crate::error::SourceError;
use crate::types::{GenerationRequest, RawCandidate};

pub mod fixture;
pub mod registry;

pub use fixture::{FixtureSource, StaticSource};
pub use registry::{SourceDescriptor, SourceRegistry, DEFAULT_SOURCE_ORDER};

/// What an adapter is asked for. `count` is a hint: adapters may return more or fewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceQuery {
    pub niche: String,
    pub city: String,
    pub country: String,
    pub count: u32,
}

impl SourceQuery {
    pub fn for_request(request: &GenerationRequest, count: u32) -> Self {
        Self {
            niche: request.niche.trim().to_string(),
            city: request.city.trim().to_string(),
            country: request.country.trim().to_string(),
            count,
        }
    }
}

/// One external data provider.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Produce candidates for `query`. An empty vector is the "nothing found" case.
    async fn scrape(&self, query: &SourceQuery) -> Result<Vec<RawCandidate>, SourceError>;
}

/// Calls `adapter`, converting a panic inside it into [`SourceError::Panicked`].
pub async fn scrape_guarded(
    adapter: &dyn SourceAdapter,
    query: &SourceQuery,
) -> Result<Vec<RawCandidate>, SourceError> {
    match AssertUnwindSafe(adapter.scrape(query)).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(SourceError::Panicked(panic_message(panic.as_ref()))),
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A configured source (`[[sources]]` config entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Registry identifier, e.g. `google_maps`
    pub id: String,

    /// JSON file holding an array of raw candidates
    pub fixture: PathBuf,

    /// Return at most `count * limit_factor` candidates per call (all when unset)
    #[serde(default)]
    pub limit_factor: Option<u32>,
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("source id cannot be empty".to_string());
        }
        if self.fixture.as_os_str().is_empty() {
            return Err(format!("source '{}' has an empty fixture path", self.id));
        }
        if self.limit_factor == Some(0) {
            return Err(format!("source '{}' has limit_factor 0", self.id));
        }
        Ok(())
    }
}
