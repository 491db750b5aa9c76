//! Lead Store
//!
//! Sink for accepted leads. The orchestrator treats persistence as best-effort: a failed
//! save is logged and the lead still counts as accepted.

pub mod persistence;

pub use persistence::SledLeadStore;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::types::Lead;

/// Lead persistence interface
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn save(&self, lead: &Lead) -> Result<(), StoreError>;
}

/// In-memory store, for tests and for embedding without a database.
#[derive(Debug, Default)]
pub struct MemoryLeadStore {
    leads: Mutex<Vec<Lead>>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leads(&self) -> Vec<Lead> {
        self.leads.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.leads.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.lock().is_empty()
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn save(&self, lead: &Lead) -> Result<(), StoreError> {
        self.leads.lock().push(lead.clone());
        Ok(())
    }
}
