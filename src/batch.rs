//! Fixed-size grouping of accepted leads for incremental delivery.

use crate::types::Lead;

pub const DEFAULT_BATCH_SIZE: usize = 30;

/// A full (or final, flushed) group of leads with its 1-based sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub number: u32,
    pub leads: Vec<Lead>,
}

/// Accumulates leads and hands out a [`Batch`] every `size` leads.
#[derive(Debug)]
pub struct Batcher {
    size: usize,
    pending: Vec<Lead>,
    emitted: u32,
}

impl Batcher {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            pending: Vec::with_capacity(size),
            emitted: 0,
        }
    }

    /// Adds a lead; returns the completed batch when this lead fills it.
    pub fn push(&mut self, lead: Lead) -> Option<Batch> {
        self.pending.push(lead);
        if self.pending.len() >= self.size {
            return Some(self.take());
        }
        None
    }

    /// Drains a partially filled batch, if any.
    pub fn flush(&mut self) -> Option<Batch> {
        if self.pending.is_empty() {
            return None;
        }
        Some(self.take())
    }

    fn take(&mut self) -> Batch {
        self.emitted += 1;
        Batch {
            number: self.emitted,
            leads: std::mem::replace(&mut self.pending, Vec::with_capacity(self.size)),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl Default for Batcher {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}
