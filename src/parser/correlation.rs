//! `@GUID {...}` correlation identifier handling.
//!
//! The identifier links a source file to its catalog entry across renames. Its
//! textual form is always a braced RFC 4122 UUID:
//! `{9968C379-A8C4-4D5A-9F23-4F79E7C3B5E9}`.

use once_cell::sync::Lazy;
use regex::Regex;

static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)@GUID\s*(\{[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}\})",
    )
    .expect("Invalid GUID marker regex")
});

static BARE_GUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("Invalid GUID regex")
});

/// Returns the first `@GUID {...}` identifier in `text`, braces included,
/// exactly as written.
///
/// Works on any text, not only parseable definitions.
pub fn extract_correlation_id(text: &str) -> Option<String> {
    MARKER_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Normalizes an identifier given with or without braces to its bare,
/// upper-case form. Returns `None` unless it is a version 1-5, RFC 4122 UUID.
pub fn canonical_guid(value: &str) -> Option<String> {
    let bare = value.replace(|c| c == '{' || c == '}', "");
    let bare = bare.trim();
    BARE_GUID_RE
        .is_match(bare)
        .then(|| bare.to_ascii_uppercase())
}

/// Braced upper-case form of a valid identifier.
pub fn braced_guid(value: &str) -> Option<String> {
    canonical_guid(value).map(|bare| format!("{{{bare}}}"))
}

/// Compares two identifiers ignoring braces and case.
pub fn same_guid(a: &str, b: &str) -> bool {
    match (canonical_guid(a), canonical_guid(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
