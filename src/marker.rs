//! GUID marker normalization
//!
//! Ensures a routine body carries exactly one `@GUID {...}` marker line with a
//! given identifier, leaving every other byte of the script untouched:
//!
//! - an existing marker line keeps its indentation, comment prefix and
//!   trailing text; only the `@GUID {...}` token changes
//! - otherwise, for `LANGUAGE plpgsql`, a new marker line goes right after the
//!   line holding the first `BEGIN`, indented like the line that follows it
//! - otherwise (e.g. `LANGUAGE sql`), it goes right after the opening
//!   delimiter line of the body
//!
//! The rewrite is total: whenever a precondition fails (invalid identifier, no
//! definition, body not dollar-quoted, no `BEGIN` in a plpgsql body) the input
//! is returned unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::scan::is_top_level_at;
use crate::parser::{canonical_guid, parse_definition, LiteralDelimiter};
use crate::util::{normalize_line_endings, LineEnding};

/// Annotation appended to freshly inserted marker lines.
pub const MARKER_ANNOTATION: &str = "DON'T CHANGE THIS LINE! The model sync uses this ID.";

static EXISTING_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^|\n)([ \t]*)(--[ \t]*)?@GUID\s*\{[^}]+\}([^\n]*)(\n|$)")
        .expect("Invalid marker line regex")
});

static BEGIN_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|\n)([ \t]*)BEGIN\b").expect("Invalid BEGIN regex"));

static PLPGSQL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bLANGUAGE\s+(?:"plpgsql"|plpgsql\b)"#).expect("Invalid LANGUAGE regex")
});

/// Returns `text` with its body marker set to `guid` (braces optional).
///
/// The output keeps the predominant line-ending convention of the input.
pub fn ensure_marker(text: &str, guid: &str) -> String {
    try_ensure_marker(text, guid).unwrap_or_else(|| text.to_string())
}

fn try_ensure_marker(text: &str, guid: &str) -> Option<String> {
    let marker = format!("@GUID {{{}}}", canonical_guid(guid)?);

    let ending = LineEnding::detect(text);
    let normalized = normalize_line_endings(text);
    let parsed = parse_definition(&normalized)?;

    let tag = match &parsed.body_literal.delimiter {
        LiteralDelimiter::Dollar { tag } => tag.as_str(),
        LiteralDelimiter::SingleQuoted { .. } => return None,
    };
    let literal = parsed.body_literal_text();
    let body = &literal[tag.len()..literal.len() - tag.len()];

    let updated_body = match replace_marker_line(body, &marker) {
        Some(updated) => updated,
        None => {
            let line = format!("-- {marker} - {MARKER_ANNOTATION}");
            if PLPGSQL_RE.is_match(&normalized) {
                insert_after_begin_line(body, &line)?
            } else {
                insert_after_opening_line(body, &line)
            }
        }
    };

    let updated_literal = format!("{tag}{updated_body}{tag}");
    Some(ending.apply(&parsed.splice_body_literal(&updated_literal)))
}

/// Swaps the `@GUID {...}` token of the first marker line, if any.
fn replace_marker_line(body: &str, marker: &str) -> Option<String> {
    let caps = EXISTING_MARKER_RE.captures(body)?;
    let whole = caps.get(0)?;
    let part = |i: usize| caps.get(i).map_or("", |m| m.as_str());

    let line = format!(
        "{}{}{}{}{}{}",
        part(1),
        part(2),
        part(3),
        marker,
        part(4),
        part(5)
    );
    Some(format!(
        "{}{}{}",
        &body[..whole.start()],
        line,
        &body[whole.end()..]
    ))
}

/// Inserts `line` after the line holding the first top-level `BEGIN`.
fn insert_after_begin_line(body: &str, line: &str) -> Option<String> {
    let begin_end = BEGIN_LINE_RE
        .find_iter(body)
        .map(|m| m.end())
        .find(|&end| is_top_level_at(body, end - "BEGIN".len()))?;

    let (insert_at, lead) = match body[begin_end..].find('\n') {
        Some(i) => (begin_end + i + 1, ""),
        None => (body.len(), "\n"),
    };
    let rest = &body[insert_at..];
    let indent_len = rest.len() - rest.trim_start_matches(|c: char| c == ' ' || c == '\t').len();
    let indent = &rest[..indent_len];

    Some(format!(
        "{}{}{}{}\n{}",
        &body[..insert_at],
        lead,
        indent,
        line,
        rest
    ))
}

/// Inserts `line` right after the first line break of the body (the line
/// holding the opening delimiter), or at the very start when there is none.
fn insert_after_opening_line(body: &str, line: &str) -> String {
    let insert_at = body.find('\n').map_or(0, |i| i + 1);
    format!("{}{}\n{}", &body[..insert_at], line, &body[insert_at..])
}
