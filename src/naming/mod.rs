//! Identifier naming helpers
//!
//! Provides the safe-name normalizer used for every generated entity
//! name and the distinguishing-suffix heuristic used when two generated
//! API names collide.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a generated name fragment.
///
/// Matches the DNS label limit, which is the tightest constraint any
/// downstream consumer places on entity names.
pub const MAX_SAFE_NAME_LEN: usize = 63;

/// Generic words dropped before picking fallback suffix words.
const SUFFIX_STOP_WORDS: &[&str] = &[
    "service",
    "request",
    "getcapabilities",
    "wms",
    "kml",
    "arcgis",
    "rest",
    "online",
];

/// A four-digit year between 1900 and 2099.
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid regex"));

/// "v2", "V 3", "version 10", "Version-4" and similar.
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bv(?:ersion)?[ ._-]?(\d+)").expect("valid regex"));

/// Any standalone run of two or more digits.
static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{2,}\b").expect("valid regex"));

/// Normalize arbitrary text into a bounded identifier fragment.
///
/// The result is lowercase, contains only `[a-z0-9-]`, never starts or
/// ends with a separator, and never exceeds [`MAX_SAFE_NAME_LEN`]
/// characters. Pathological input (no alphanumeric characters at all)
/// yields an empty string. The function is idempotent.
///
/// # Examples
///
/// ```
/// use catalogue_sync_sdk::naming::to_safe_name;
///
/// assert_eq!(to_safe_name("ABC def_123!!"), "abc-def-123");
/// assert_eq!(to_safe_name("--Roads / Highways--"), "roads-highways");
/// assert_eq!(to_safe_name("!!!"), "");
/// ```
pub fn to_safe_name(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut pending_separator = false;

    for ch in lower.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.push(ch);
        } else {
            // Collapse every run of disallowed characters to one hyphen;
            // leading runs are dropped by the is_empty guard above.
            pending_separator = true;
        }
    }

    out.truncate(MAX_SAFE_NAME_LEN);
    // Truncation may expose a trailing separator.
    out.trim_end_matches(['-', '_', '.']).to_string()
}

/// Extract a short token that distinguishes one resource name from
/// another otherwise-identical one.
///
/// Tie-break order: a year (1900-2099), a version token normalized to
/// `v<digits>`, any standalone run of 2+ digits, then the last one or
/// two non-generic words of the normalized name, then its final 10
/// characters. Heuristic only; uniqueness is enforced by the caller.
///
/// # Examples
///
/// ```
/// use catalogue_sync_sdk::naming::distinguishing_suffix;
///
/// assert_eq!(distinguishing_suffix("Roads Service 2023"), "2023");
/// assert_eq!(distinguishing_suffix("Parcel Map Version 10"), "v10");
/// ```
pub fn distinguishing_suffix(raw_name: &str) -> String {
    if let Some(year) = YEAR_RE.find(raw_name) {
        return year.as_str().to_string();
    }

    if let Some(caps) = VERSION_RE.captures(raw_name) {
        return format!("v{}", &caps[1]);
    }

    if let Some(digits) = DIGITS_RE.find(raw_name) {
        return digits.as_str().to_string();
    }

    let safe = to_safe_name(raw_name);
    let words: Vec<&str> = safe
        .split('-')
        .filter(|w| !w.is_empty() && !SUFFIX_STOP_WORDS.contains(w))
        .collect();

    match words.as_slice() {
        [] => safe[safe.len().saturating_sub(10)..].to_string(),
        [only] => (*only).to_string(),
        [.., a, b] => format!("{a}-{b}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_name_is_idempotent() {
        for input in ["ABC def_123!!", "  __weird..name__  ", "Forêt / Carte"] {
            let once = to_safe_name(input);
            assert_eq!(to_safe_name(&once), once);
        }
    }

    #[test]
    fn safe_name_never_exceeds_limit() {
        let long = "x y".repeat(100);
        let name = to_safe_name(&long);
        assert!(name.len() <= MAX_SAFE_NAME_LEN);
        assert!(!name.ends_with('-'));
    }

    #[test]
    fn suffix_prefers_year_over_other_digits() {
        assert_eq!(distinguishing_suffix("Census 42 blocks 1996"), "1996");
    }
}
