//! Generation run loop: drives one session through the registered sources in order.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::batch::{Batcher, DEFAULT_BATCH_SIZE};
use crate::session::handle::SessionHandle;
use crate::source::{scrape_guarded, SourceQuery, SourceRegistry};
use crate::store::LeadStore;
use crate::validation::{Evaluation, ValidationConfig, Validator};

/// Per-run knobs taken from configuration.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub batch_size: usize,
    /// Emit leftover leads as a final batch before `completed`
    pub flush_partial_batch: bool,
    pub validation: ValidationConfig,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            flush_partial_batch: true,
            validation: ValidationConfig::default(),
        }
    }
}

/// Shared, read-only collaborators for every run.
#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<SourceRegistry>,
    store: Arc<dyn LeadStore>,
    settings: RunSettings,
}

enum SourceOutcome {
    Continue,
    TargetReached,
    Stopped,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<SourceRegistry>,
        store: Arc<dyn LeadStore>,
        settings: RunSettings,
    ) -> Self {
        Self {
            registry,
            store,
            settings,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run `handle` to a terminal state. Returns early, without emitting anything more,
    /// if the session is cancelled along the way.
    #[instrument(skip_all, fields(session_id = %handle.id()))]
    pub async fn run(&self, handle: Arc<SessionHandle>) {
        let request = handle.request().clone();
        let mut validator = Validator::new(self.settings.validation.clone());
        let mut batcher = Batcher::new(self.settings.batch_size);
        let mut cancel = handle.cancel_signal();

        info!(
            niche = %request.niche,
            city = %request.city,
            target = request.target_count,
            sources = self.registry.len(),
            "Starting lead generation"
        );

        for source in self.registry.iter() {
            if handle.target_reached() {
                break;
            }
            if !handle.enter_source(&source.id) {
                debug!(source = %source.id, "Session stopped before source call");
                return;
            }

            let query = SourceQuery::for_request(&request, handle.remaining());
            debug!(source = %source.id, count = query.count, "Calling source");
            let scraped = tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => {
                    info!(source = %source.id, "Cancelled during source call");
                    return;
                }
                result = scrape_guarded(source.adapter.as_ref(), &query) => result,
            };

            let candidates = match scraped {
                Ok(candidates) => candidates,
                Err(err) => {
                    warn!(source = %source.id, error = %err, "Source failed, skipping");
                    continue;
                }
            };
            debug!(source = %source.id, candidates = candidates.len(), "Source returned");

            let mut outcome = SourceOutcome::Continue;
            for candidate in &candidates {
                let evaluation = validator.evaluate(candidate, &source.id, &request);
                let recorded = match evaluation {
                    Evaluation::Accepted(lead) => {
                        let batch = batcher.push(lead.clone());
                        let recorded = handle.record_accepted(&lead, batch);
                        // Counted leads are always persisted, even if a cancel lands mid-save.
                        if recorded {
                            if let Err(err) = self.store.save(&lead).await {
                                warn!(lead = %lead.name, error = %err, "Failed to persist lead");
                            }
                        }
                        recorded
                    }
                    Evaluation::Rejected(reason) => {
                        debug!(source = %source.id, reason = reason.as_str(), "Candidate rejected");
                        handle.record_rejected()
                    }
                };
                if !recorded {
                    outcome = SourceOutcome::Stopped;
                    break;
                }
                if handle.target_reached() {
                    outcome = SourceOutcome::TargetReached;
                    break;
                }
            }

            match outcome {
                SourceOutcome::Stopped => {
                    info!(source = %source.id, "Session stopped mid-source");
                    return;
                }
                SourceOutcome::TargetReached => break,
                SourceOutcome::Continue => {}
            }
        }

        let trailing = if self.settings.flush_partial_batch {
            batcher.flush()
        } else {
            None
        };
        let rejections = validator.rejections();
        if handle.complete(trailing) {
            let snap = handle.snapshot();
            info!(
                valid = snap.valid,
                generated = snap.generated,
                rejected = rejections.total(),
                duplicates = rejections.duplicate,
                "Lead generation completed"
            );
        }
    }
}

/// Resolves once cancellation has been signalled.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
