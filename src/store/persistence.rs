//! Persistence layer for accepted leads

use async_trait::async_trait;
use sled;
use std::path::Path;

use crate::error::StoreError;
use crate::store::LeadStore;
use crate::types::Lead;

const TREE_LEADS: &str = "leads";

/// Sled-based implementation of [`LeadStore`]
///
/// Leads are bincode-encoded and keyed by sled's monotonic id generator, so iteration
/// returns them in insertion order.
#[derive(Clone)]
pub struct SledLeadStore {
    db: sled::Db,
    leads: sled::Tree,
}

impl SledLeadStore {
    /// Open (or create) a store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Self::with_db(db)
    }

    pub fn with_db(db: sled::Db) -> Result<Self, StoreError> {
        let leads = db.open_tree(TREE_LEADS)?;
        Ok(Self { db, leads })
    }

    /// All stored leads in insertion order
    pub fn list(&self) -> Result<Vec<Lead>, StoreError> {
        let mut out = Vec::with_capacity(self.leads.len());
        for entry in self.leads.iter() {
            let (_, value) = entry?;
            out.push(bincode::deserialize(&value)?);
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

#[async_trait]
impl LeadStore for SledLeadStore {
    async fn save(&self, lead: &Lead) -> Result<(), StoreError> {
        let id = self.db.generate_id()?;
        let value = bincode::serialize(lead)?;
        self.leads.insert(id.to_be_bytes(), value)?;
        Ok(())
    }
}
