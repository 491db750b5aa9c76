//! Session-scoped fuzzy duplicate detection over accepted names.

use unicode_normalization::UnicodeNormalization;

/// Default similarity at or above which two names are considered the same business.
pub const DEFAULT_DEDUP_THRESHOLD: f64 = 0.8;

/// Canonical dedup key: trimmed, NFC-normalized, lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().nfc().collect::<String>().to_lowercase()
}

/// Edit-distance similarity: `1 - levenshtein(a, b) / max(len(a), len(b))`.
/// Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Accepted-name keys for one session. Lookups are linear in the number of
/// accepted names, which is bounded by the maximum target count.
#[derive(Debug, Clone)]
pub struct DedupIndex {
    keys: Vec<String>,
    threshold: f64,
}

impl DedupIndex {
    pub fn new(threshold: f64) -> Self {
        Self {
            keys: Vec::new(),
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the first accepted key that `name` is a near-duplicate of.
    pub fn find_match(&self, name: &str) -> Option<&str> {
        let key = normalize_name(name);
        self.keys
            .iter()
            .find(|existing| similarity(&key, existing) >= self.threshold)
            .map(String::as_str)
    }

    pub fn insert(&mut self, name: &str) {
        self.keys.push(normalize_name(name));
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for DedupIndex {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_THRESHOLD)
    }
}
