//! Lead validation
//!
//! Turns raw source candidates into scored [`Lead`]s. A candidate is accepted only when it
//! has a name, at least one valid contact channel (phone or email), and a name that is not
//! a near-duplicate of a lead already accepted in the same session.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::{GenerationRequest, Lead, RawCandidate, SourceId};

pub mod contact;
pub mod dedup;
pub mod score;

pub use contact::{is_valid_email, is_valid_website, normalize_phone};
pub use dedup::{normalize_name, similarity, DedupIndex, DEFAULT_DEDUP_THRESHOLD};
pub use score::{ScoreInputs, ScoreWeights, MAX_SCORE};

/// Validation settings (`[validation]` config section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Name similarity at or above which a candidate is a duplicate
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f64,

    /// Minimum digits in a phone number after separators are stripped
    #[serde(default = "default_min_phone_digits")]
    pub min_phone_digits: usize,

    #[serde(default)]
    pub weights: ScoreWeights,
}

fn default_dedup_threshold() -> f64 {
    DEFAULT_DEDUP_THRESHOLD
}

fn default_min_phone_digits() -> usize {
    10
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            dedup_threshold: default_dedup_threshold(),
            min_phone_digits: default_min_phone_digits(),
            weights: ScoreWeights::default(),
        }
    }
}

impl ValidationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.dedup_threshold > 0.0 && self.dedup_threshold <= 1.0) {
            return Err(format!(
                "dedup_threshold must be in (0, 1], got {}",
                self.dedup_threshold
            ));
        }
        if self.min_phone_digits == 0 {
            return Err("min_phone_digits must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Why a candidate was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    MissingName,
    NoContact,
    Duplicate { matched: String },
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingName => "missing_name",
            RejectReason::NoContact => "no_contact",
            RejectReason::Duplicate { .. } => "duplicate",
        }
    }
}

/// Outcome of [`Validator::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Accepted(Lead),
    Rejected(RejectReason),
}

impl Evaluation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Evaluation::Accepted(_))
    }
}

/// Per-reason rejection counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RejectionStats {
    pub missing_name: u32,
    pub no_contact: u32,
    pub duplicate: u32,
}

impl RejectionStats {
    fn record(&mut self, reason: &RejectReason) {
        match reason {
            RejectReason::MissingName => self.missing_name += 1,
            RejectReason::NoContact => self.no_contact += 1,
            RejectReason::Duplicate { .. } => self.duplicate += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.missing_name + self.no_contact + self.duplicate
    }
}

/// Session-scoped validator. Owns the dedup index for the session it serves.
#[derive(Debug)]
pub struct Validator {
    config: ValidationConfig,
    dedup: DedupIndex,
    rejections: RejectionStats,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        let dedup = DedupIndex::new(config.dedup_threshold);
        Self {
            config,
            dedup,
            rejections: RejectionStats::default(),
        }
    }

    /// Evaluate one candidate produced by `source` for `request`.
    ///
    /// On acceptance the normalized name joins the dedup index, so a later
    /// near-identical name in the same session is rejected.
    pub fn evaluate(
        &mut self,
        candidate: &RawCandidate,
        source: &SourceId,
        request: &GenerationRequest,
    ) -> Evaluation {
        let outcome = self.check(candidate, source, request);
        if let Evaluation::Rejected(reason) = &outcome {
            self.rejections.record(reason);
        }
        outcome
    }

    fn check(
        &mut self,
        candidate: &RawCandidate,
        source: &SourceId,
        request: &GenerationRequest,
    ) -> Evaluation {
        let name = match trimmed(&candidate.name) {
            Some(name) => name,
            None => return Evaluation::Rejected(RejectReason::MissingName),
        };

        let phone = candidate
            .phone
            .as_deref()
            .and_then(|raw| normalize_phone(raw, self.config.min_phone_digits));
        let email = trimmed(&candidate.email).filter(|e| is_valid_email(e));
        if phone.is_none() && email.is_none() {
            return Evaluation::Rejected(RejectReason::NoContact);
        }

        if let Some(matched) = self.dedup.find_match(&name) {
            return Evaluation::Rejected(RejectReason::Duplicate {
                matched: matched.to_string(),
            });
        }

        let website = trimmed(&candidate.website).filter(|w| is_valid_website(w));
        let candidate_city = trimmed(&candidate.city);
        let score = self.config.weights.score(ScoreInputs {
            has_name: true,
            phone_valid: phone.is_some(),
            email_valid: email.is_some(),
            website_valid: website.is_some(),
            has_city: candidate_city.is_some(),
        });

        self.dedup.insert(&name);
        Evaluation::Accepted(Lead {
            name,
            phone,
            email,
            website,
            source: source.clone(),
            city: candidate_city.unwrap_or_else(|| request.city.trim().to_string()),
            niche: request.niche.trim().to_string(),
            country: request.country.trim().to_string(),
            score,
            created_at: Utc::now(),
        })
    }

    pub fn rejections(&self) -> RejectionStats {
        self.rejections
    }

    pub fn accepted_names(&self) -> usize {
        self.dedup.len()
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
