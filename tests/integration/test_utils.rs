//! Shared test utilities for integration tests
//!
//! Scripted source adapters and stores, plus helpers to build a service around them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use leadgen::progress::EventEnvelope;
use leadgen::service::{GenerationService, ServiceSettings};
use leadgen::source::{SourceAdapter, SourceQuery, SourceRegistry};
use leadgen::store::{LeadStore, MemoryLeadStore};
use leadgen::{GenerationRequest, Lead, RawCandidate, SessionId, SourceError, StoreError};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Business-like name that stays far below the dedup threshold from every other `i`.
pub fn distinct_name(i: u64) -> String {
    let mut z = i.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    format!("loja {:016x}", z ^ (z >> 31))
}

/// `count` valid candidates, named from `offset` on.
pub fn valid_candidates(offset: u64, count: u64) -> Vec<RawCandidate> {
    (offset..offset + count)
        .map(|i| RawCandidate::named(distinct_name(i)).with_phone(format!("41{:08}", i)))
        .collect()
}

pub fn petshop_request(count: u32) -> GenerationRequest {
    GenerationRequest::new("petshop", "Curitiba", count, "user-1").with_country("Brasil")
}

/// Returns fixed candidates and records every query it receives.
#[derive(Default)]
pub struct RecordingSource {
    candidates: Vec<RawCandidate>,
    queries: Mutex<Vec<SourceQuery>>,
}

impl RecordingSource {
    pub fn new(candidates: Vec<RawCandidate>) -> Arc<Self> {
        Arc::new(Self {
            candidates,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn queries(&self) -> Vec<SourceQuery> {
        self.queries.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().len()
    }
}

#[async_trait]
impl SourceAdapter for RecordingSource {
    async fn scrape(&self, query: &SourceQuery) -> Result<Vec<RawCandidate>, SourceError> {
        self.queries.lock().push(query.clone());
        Ok(self.candidates.clone())
    }
}

pub struct FailingSource;

#[async_trait]
impl SourceAdapter for FailingSource {
    async fn scrape(&self, _query: &SourceQuery) -> Result<Vec<RawCandidate>, SourceError> {
        Err(SourceError::Unavailable("upstream timed out".to_string()))
    }
}

pub struct PanickingSource;

#[async_trait]
impl SourceAdapter for PanickingSource {
    async fn scrape(&self, _query: &SourceQuery) -> Result<Vec<RawCandidate>, SourceError> {
        panic!("adapter blew up");
    }
}

/// Signals `entered` when called, then blocks until `release` is notified.
pub struct GatedSource {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
    candidates: Vec<RawCandidate>,
}

impl GatedSource {
    pub fn new(candidates: Vec<RawCandidate>) -> Arc<Self> {
        Arc::new(Self {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
            candidates,
        })
    }
}

#[async_trait]
impl SourceAdapter for GatedSource {
    async fn scrape(&self, _query: &SourceQuery) -> Result<Vec<RawCandidate>, SourceError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.candidates.clone())
    }
}

/// Every save fails.
#[derive(Default)]
pub struct FailingStore {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl LeadStore for FailingStore {
    async fn save(&self, _lead: &Lead) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Database("disk full".to_string()))
    }
}

/// Saves block until released; `saved` counts completed saves.
#[derive(Default)]
pub struct GatedStore {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
    pub saved: AtomicUsize,
}

#[async_trait]
impl LeadStore for GatedStore {
    async fn save(&self, _lead: &Lead) -> Result<(), StoreError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.saved.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Every save panics, which the service treats as an internal fault.
pub struct PanickingStore;

#[async_trait]
impl LeadStore for PanickingStore {
    async fn save(&self, _lead: &Lead) -> Result<(), StoreError> {
        panic!("store invariant violated");
    }
}

pub fn registry(sources: Vec<(&str, Arc<dyn SourceAdapter>)>) -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    for (id, adapter) in sources {
        registry.register(id, adapter).unwrap();
    }
    registry
}

pub fn service_with_store(
    sources: Vec<(&str, Arc<dyn SourceAdapter>)>,
    store: Arc<dyn LeadStore>,
) -> GenerationService {
    GenerationService::new(registry(sources), store, ServiceSettings::default())
}

pub fn service(sources: Vec<(&str, Arc<dyn SourceAdapter>)>) -> (GenerationService, Arc<MemoryLeadStore>) {
    let store = Arc::new(MemoryLeadStore::new());
    let service = service_with_store(sources, store.clone());
    (service, store)
}

/// Drain every event of a session until it closes.
pub async fn collect_events(service: &GenerationService, id: &SessionId) -> Vec<EventEnvelope> {
    let mut subscription = service.subscribe(id).expect("session should exist");
    let mut events = Vec::new();
    while let Some(event) = subscription.next().await {
        events.push(event);
    }
    events
}

pub fn kinds(events: &[EventEnvelope]) -> Vec<&'static str> {
    events.iter().map(|e| e.event.kind()).collect()
}
