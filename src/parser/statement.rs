//! Statement location: the `CREATE FUNCTION|PROCEDURE` keyword span and an
//! optional trailing `COMMENT ON FUNCTION|PROCEDURE ... IS ...;` statement.

use once_cell::sync::Lazy;
use regex::Regex;

use super::definition::RoutineKind;
use super::scan::dollar_tag_at;
use crate::util::normalize_line_endings;

static CREATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)CREATE\s+(?:OR\s+REPLACE\s+)?(FUNCTION|PROCEDURE)\s+")
        .expect("Invalid CREATE regex")
});

// Plain pattern search: not aware of comments or literals
// in the text before it, unlike the scanner-based searches.
static TRAILING_COMMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)COMMENT\s+ON\s+(FUNCTION|PROCEDURE).+?IS\s+(\$[A-Za-z0-9_]*\$.*?\$[A-Za-z0-9_]*\$|'(?:''|[^'])*')\s*;(.*)$",
    )
    .expect("Invalid COMMENT ON regex")
});

/// Location of the `CREATE [OR REPLACE] FUNCTION|PROCEDURE` keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateKeyword {
    pub kind: RoutineKind,
    /// Offset of `CREATE`.
    pub start: usize,
    /// Offset just past the whitespace following `FUNCTION`/`PROCEDURE`.
    pub after_keyword: usize,
}

/// First `CREATE [OR REPLACE] FUNCTION|PROCEDURE` in `text`.
pub fn locate_create(text: &str) -> Option<CreateKeyword> {
    let caps = CREATE_RE.captures(text)?;
    let whole = caps.get(0)?;
    let kind = if caps.get(1)?.as_str().eq_ignore_ascii_case("FUNCTION") {
        RoutineKind::Function
    } else {
        RoutineKind::Procedure
    };
    Some(CreateKeyword {
        kind,
        start: whole.start(),
        after_keyword: whole.end(),
    })
}

/// A `COMMENT ON FUNCTION|PROCEDURE ... IS <literal>;` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailingComment {
    /// Offset where the `COMMENT` keyword starts.
    pub start: usize,
    /// Unwrapped literal, `\n` line endings.
    pub text: String,
    /// Offset just past the terminating `;`.
    pub end: usize,
}

/// Finds the trailing comment statement starting strictly after `create_start`.
pub fn locate_trailing_comment(text: &str, create_start: usize) -> Option<TrailingComment> {
    let search_from = create_start + 1;
    if search_from > text.len() || !text.is_char_boundary(search_from) {
        return None;
    }
    let caps = TRAILING_COMMENT_RE.captures(&text[search_from..])?;
    let whole = caps.get(0)?;
    let literal = caps.get(2)?;
    let after = caps.get(3)?;

    Some(TrailingComment {
        start: search_from + whole.start(),
        text: unquote_comment_literal(literal.as_str())?,
        end: search_from + after.start(),
    })
}

/// Strips the delimiters of a dollar-quoted or single-quoted comment literal.
/// `None` when the closing dollar tag differs from the opening one.
fn unquote_comment_literal(literal: &str) -> Option<String> {
    let inner = match dollar_tag_at(literal, 0) {
        Some(tag) => literal.strip_prefix(tag)?.strip_suffix(tag)?.to_string(),
        None => literal
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .unwrap_or(literal)
            .replace("''", "'"),
    };
    Some(normalize_line_endings(&inner))
}
