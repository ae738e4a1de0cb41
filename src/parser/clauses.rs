//! Option clause extraction
//!
//! Works on the option text of a definition: everything between the argument
//! list and the body literal, plus everything after the literal. Each clause is
//! extracted independently from the same text, so clauses may appear in any
//! order and on either side of the body.

use once_cell::sync::Lazy;
use regex::Regex;

use super::definition::{Language, ParallelSafety, Volatility};
use super::scan::mask_comments;
use crate::util::collapse_whitespace;

/// Keywords that end a `RETURNS` payload.
const OPTION_TERMINATORS: &[&str] = &[
    "LANGUAGE",
    "IMMUTABLE",
    "STABLE",
    "VOLATILE",
    "STRICT",
    "RETURNS",
    "SECURITY",
    "COST",
    "ROWS",
    "PARALLEL",
    "WINDOW",
    "CALLED",
    "LEAKPROOF",
    "NOT",
    "SET",
    "AS",
    "TRANSFORM",
];

/// Sentinel appended to the option text so a clause running to the end of the
/// text still has a terminator.
const END_SENTINEL: &str = "__END__";

static RETURNS_RE: Lazy<Regex> = Lazy::new(|| clause_regex("RETURNS"));

static LANGUAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bLANGUAGE\s+(?:"([^"]+)"|([A-Za-z0-9_]+))"#)
        .expect("Invalid LANGUAGE regex")
});

static COST_RE: Lazy<Regex> = Lazy::new(|| numeric_option_regex("COST"));
static ROWS_RE: Lazy<Regex> = Lazy::new(|| numeric_option_regex("ROWS"));

static PARALLEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bPARALLEL\s+(SAFE|RESTRICTED|UNSAFE)\b").expect("Invalid PARALLEL regex")
});

static IMMUTABLE_RE: Lazy<Regex> = Lazy::new(|| word_regex("IMMUTABLE"));
static STABLE_RE: Lazy<Regex> = Lazy::new(|| word_regex("STABLE"));
static STRICT_RE: Lazy<Regex> = Lazy::new(|| word_regex("STRICT"));
static LEAKPROOF_RE: Lazy<Regex> = Lazy::new(|| word_regex("LEAKPROOF"));
static WINDOW_RE: Lazy<Regex> = Lazy::new(|| word_regex("WINDOW"));

/// Builds `KEYWORD\s+(payload)` where the lazy payload stops at the first
/// whole-word terminator other than the keyword itself.
fn clause_regex(keyword: &str) -> Regex {
    let terminators = OPTION_TERMINATORS
        .iter()
        .copied()
        .filter(|term| !term.eq_ignore_ascii_case(keyword))
        .chain(std::iter::once(END_SENTINEL))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?is)\b{keyword}\s+(.+?)\b(?:{terminators})\b"))
        .expect("Invalid clause regex")
}

fn numeric_option_regex(keyword: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{keyword}\s+([0-9]+(?:\.[0-9]+)?)"))
        .expect("Invalid numeric option regex")
}

fn word_regex(word: &str) -> Regex {
    Regex::new(&format!(r"\b{word}\b")).expect("Invalid word regex")
}

/// Every option recognised in the text surrounding a body literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedOptions {
    /// Trimmed `RETURNS` payload, empty when absent.
    pub returns: String,
    pub language: Language,
    pub volatility: Volatility,
    pub is_security_definer: bool,
    pub is_leakproof: bool,
    pub is_strict: bool,
    pub cost: Option<String>,
    pub rows: Option<String>,
    pub is_window: bool,
    pub parallel: ParallelSafety,
}

/// Extracts all option clauses from `segment`. Comments are ignored.
pub fn extract_options(segment: &str) -> ExtractedOptions {
    let masked = mask_comments(segment);
    let segment = masked.as_ref();

    // Flag checks run on whitespace-collapsed, upper-cased text padded with spaces.
    let upper = format!(" {} ", collapse_whitespace(segment).to_uppercase());

    let volatility = if IMMUTABLE_RE.is_match(&upper) {
        Volatility::Immutable
    } else if STABLE_RE.is_match(&upper) {
        Volatility::Stable
    } else {
        Volatility::Volatile
    };

    ExtractedOptions {
        returns: extract_returns(segment),
        language: extract_language(segment),
        volatility,
        is_security_definer: upper.contains("SECURITY DEFINER"),
        is_leakproof: LEAKPROOF_RE.is_match(&upper) && !upper.contains("NOT LEAKPROOF"),
        is_strict: STRICT_RE.is_match(&upper)
            || upper.contains("RETURNS NULL ON NULL INPUT")
            || upper.contains("CALLED ON NULL INPUT"),
        cost: capture_first(&COST_RE, segment),
        rows: capture_first(&ROWS_RE, segment),
        is_window: WINDOW_RE.is_match(&upper),
        parallel: extract_parallel(segment).unwrap_or_default(),
    }
}

fn extract_returns(segment: &str) -> String {
    let search = format!("{segment}\n{END_SENTINEL}");
    capture_first(&RETURNS_RE, &search)
        .map(|payload| payload.trim().to_string())
        .unwrap_or_default()
}

fn extract_language(segment: &str) -> Language {
    let token = LANGUAGE_RE
        .captures(segment)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().replace('"', ""));
    Language::resolve(token.as_deref())
}

fn extract_parallel(segment: &str) -> Option<ParallelSafety> {
    let value = capture_first(&PARALLEL_RE, segment)?;
    match value.to_ascii_uppercase().as_str() {
        "SAFE" => Some(ParallelSafety::Safe),
        "RESTRICTED" => Some(ParallelSafety::Restricted),
        "UNSAFE" => Some(ParallelSafety::Unsafe),
        _ => None,
    }
}

fn capture_first(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
