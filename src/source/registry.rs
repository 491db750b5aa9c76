//! Source registry: ordered, fixed list of adapters shared across sessions.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::error::GenerationError;
use crate::source::{FixtureSource, SourceAdapter, SourceConfig};
use crate::types::SourceId;

/// Conventional query order for the production source set.
pub const DEFAULT_SOURCE_ORDER: [&str; 4] = ["google_maps", "instagram", "telegram", "website"];

#[derive(Clone)]
pub struct SourceDescriptor {
    pub id: SourceId,
    pub adapter: Arc<dyn SourceAdapter>,
}

impl std::fmt::Debug for SourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDescriptor")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Sources in iteration order. Order is the registration order and never changes
/// once the registry is handed to the service.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source. Identifiers must be unique.
    pub fn register(
        &mut self,
        id: impl Into<SourceId>,
        adapter: Arc<dyn SourceAdapter>,
    ) -> Result<(), GenerationError> {
        let id = id.into();
        if self.get(&id).is_some() {
            return Err(GenerationError::Config(format!(
                "source '{id}' is already registered"
            )));
        }
        self.sources.push(SourceDescriptor { id, adapter });
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_source(
        mut self,
        id: impl Into<SourceId>,
        adapter: Arc<dyn SourceAdapter>,
    ) -> Result<Self, GenerationError> {
        self.register(id, adapter)?;
        Ok(self)
    }

    /// Build a registry of fixture sources from config. Relative fixture paths are
    /// resolved against `base_dir`.
    pub fn from_config(
        sources: &[SourceConfig],
        base_dir: &Path,
    ) -> Result<Self, GenerationError> {
        let mut registry = Self::new();
        let mut seen = HashSet::new();
        for source in sources {
            source.validate().map_err(GenerationError::Config)?;
            if !seen.insert(source.id.as_str()) {
                return Err(GenerationError::Config(format!(
                    "duplicate source id '{}'",
                    source.id
                )));
            }
            let path = if source.fixture.is_absolute() {
                source.fixture.clone()
            } else {
                base_dir.join(&source.fixture)
            };
            let adapter = FixtureSource::new(path).with_limit_factor(source.limit_factor);
            registry.register(source.id.as_str(), Arc::new(adapter))?;
        }
        Ok(registry)
    }

    pub fn get(&self, id: &SourceId) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| &s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.sources.iter()
    }

    pub fn ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
