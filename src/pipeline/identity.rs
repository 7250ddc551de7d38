//! CUIL extraction and check-digit validation.
//!
//! A CUIL is 11 digits: a two-digit type prefix, an 8-digit document number
//! and a modulo-11 check digit. Scanned reports print it with hyphens or
//! spaces ("20-11122222-4", "20 11122222 4"), so extraction normalizes first.

use std::sync::LazyLock;

use regex::Regex;

/// Accepted type prefixes.
pub const PREFIXES: [&str; 5] = ["20", "23", "24", "27", "30"];

const WEIGHTS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];

// Bounded by non-digits so a longer digit run never yields a partial match.
static CUIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])((?:20|23|24|27|30)[0-9]{9})(?:[^0-9]|$)").unwrap()
});

/// Remove spaces, tabs and hyphens. Line breaks are kept so digits on
/// adjacent lines never fuse into one run.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '-'))
        .collect()
}

/// First CUIL-shaped number in `text`, after normalization.
///
/// Digit groups on the same line are joined, so a line holding unrelated
/// numbers side by side may hide a CUIL.
pub fn extract(text: &str) -> Option<String> {
    let normalized = normalize(text);
    CUIL_PATTERN
        .captures(&normalized)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Expected check digit for a 10-digit base, or `None` when the base admits
/// no valid digit (remainder 10) or is malformed.
pub fn check_digit(base: &str) -> Option<u32> {
    if base.len() != WEIGHTS.len() || !base.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let sum: u32 = base
        .bytes()
        .zip(WEIGHTS)
        .map(|(b, w)| u32::from(b - b'0') * w)
        .sum();

    match 11 - (sum % 11) {
        11 => Some(0),
        10 => None,
        r => Some(r),
    }
}

/// Whether `number` is an 11-digit CUIL with a correct check digit.
pub fn validate(number: &str) -> bool {
    if number.len() != 11 || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let (base, last) = number.split_at(10);
    let Some(expected) = check_digit(base) else {
        return false;
    };
    last.bytes().next().map(|b| u32::from(b - b'0')) == Some(expected)
}
