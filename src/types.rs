//! Core data model: requests, raw candidates and validated leads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GenerationError;

pub const DEFAULT_COUNTRY: &str = "Brasil";
pub const MIN_NICHE_LEN: usize = 2;
pub const MAX_NICHE_LEN: usize = 100;

/// Identifier of a registered source adapter (e.g. `google_maps`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Opaque, process-unique identifier of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

/// Input to a generation run. Immutable once the session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub niche: String,
    pub city: String,
    #[serde(default = "default_country")]
    pub country: String,
    pub target_count: u32,
    pub requester: String,
}

impl GenerationRequest {
    pub fn new(
        niche: impl Into<String>,
        city: impl Into<String>,
        target_count: u32,
        requester: impl Into<String>,
    ) -> Self {
        Self {
            niche: niche.into(),
            city: city.into(),
            country: default_country(),
            target_count,
            requester: requester.into(),
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Check field constraints. `max_target` is the configured upper bound for
    /// `target_count` (inclusive).
    pub fn validate(&self, max_target: u32) -> Result<(), GenerationError> {
        let niche_len = self.niche.trim().chars().count();
        if !(MIN_NICHE_LEN..=MAX_NICHE_LEN).contains(&niche_len) {
            return Err(GenerationError::InvalidRequest(format!(
                "niche must be between {MIN_NICHE_LEN} and {MAX_NICHE_LEN} characters"
            )));
        }
        if self.city.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "city is required".to_string(),
            ));
        }
        if self.country.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "country is required".to_string(),
            ));
        }
        if self.requester.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "requester is required".to_string(),
            ));
        }
        if self.target_count < 1 || self.target_count > max_target {
            return Err(GenerationError::InvalidRequest(format!(
                "target count must be between 1 and {max_target}, got {}",
                self.target_count
            )));
        }
        Ok(())
    }
}

/// Source-provided record prior to validation. May be wholly empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Score proposed by the adapter. Never persisted; the validator scores leads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_score: Option<u8>,
}

impl RawCandidate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }
}

/// A validated, scored lead. Always carries a valid phone or a valid email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub source: SourceId,
    pub city: String,
    pub niche: String,
    pub country: String,
    pub score: u8,
    pub created_at: DateTime<Utc>,
}
