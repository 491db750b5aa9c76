//! Contact field checks: phone, email and website formats.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").expect("email pattern is valid")
});

/// Separator characters stripped from phone numbers before the digit check.
fn is_phone_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '-' | '.')
}

/// Returns the digit-only form of `raw` if it is a plausible phone number:
/// at least `min_digits` characters once separators are removed, all of them ASCII digits.
pub fn normalize_phone(raw: &str, min_digits: usize) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| !is_phone_separator(*c)).collect();
    if cleaned.len() < min_digits || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(cleaned)
}

pub fn is_valid_email(raw: &str) -> bool {
    EMAIL_PATTERN.is_match(raw.trim())
}

/// True when `raw` parses as an absolute http or https URL.
pub fn is_valid_website(raw: &str) -> bool {
    match Url::parse(raw.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}
