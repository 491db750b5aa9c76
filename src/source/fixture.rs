//! File- and memory-backed adapters.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::SourceError;
use crate::source::{SourceAdapter, SourceQuery};
use crate::types::RawCandidate;

/// Reads a JSON array of [`RawCandidate`] from disk on every call.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    path: PathBuf,
    limit_factor: Option<u32>,
}

impl FixtureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            limit_factor: None,
        }
    }

    /// Cap each response at `count * factor` candidates.
    pub fn with_limit_factor(mut self, factor: Option<u32>) -> Self {
        self.limit_factor = factor;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<Vec<RawCandidate>, SourceError> {
        let raw = std::fs::read(path).map_err(|source| SourceError::Fixture {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl SourceAdapter for FixtureSource {
    async fn scrape(&self, query: &SourceQuery) -> Result<Vec<RawCandidate>, SourceError> {
        let path = self.path.clone();
        let mut candidates = tokio::task::spawn_blocking(move || Self::load(&path))
            .await
            .map_err(|e| SourceError::Unavailable(format!("fixture loader failed: {e}")))??;
        if let Some(factor) = self.limit_factor {
            let cap = query.count.saturating_mul(factor) as usize;
            candidates.truncate(cap);
        }
        Ok(candidates)
    }
}

/// Returns a fixed list of candidates, ignoring the query.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    candidates: Vec<RawCandidate>,
}

impl StaticSource {
    pub fn new(candidates: Vec<RawCandidate>) -> Self {
        Self { candidates }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    async fn scrape(&self, _query: &SourceQuery) -> Result<Vec<RawCandidate>, SourceError> {
        Ok(self.candidates.clone())
    }
}
