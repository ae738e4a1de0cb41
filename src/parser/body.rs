//! Body literal location
//!
//! After the argument list, the first top-level `AS` at parenthesis depth 0
//! introduces the routine body. Two literal forms are recognised:
//!
//! ```sql
//! CREATE FUNCTION f() RETURNS int AS $body$ ... $body$ LANGUAGE plpgsql;
//! CREATE FUNCTION f() RETURNS int AS 'obj_file', 'link_symbol' LANGUAGE c;
//! ```

use std::ops::Range;

use super::scan::{dollar_tag_at, top_level_positions};
use crate::util::{is_keyword_at, skip_whitespace, trim_blank_lines};

/// How the body literal is delimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralDelimiter {
    /// `$tag$ ... $tag$`; `tag` holds the full delimiter including both `$`.
    Dollar { tag: String },
    /// `'...'`, optionally followed by `, '<link symbol>'`.
    SingleQuoted { has_link_symbol: bool },
}

/// The located body literal of a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyLiteral {
    /// Byte range of the literal, delimiters included.
    pub span: Range<usize>,
    pub delimiter: LiteralDelimiter,
    /// Unwrapped body with surrounding blank lines removed.
    pub body_text: String,
}

#[derive(Debug)]
struct QuotedLiteral {
    end: usize,
    content: String,
}

/// Locates the body literal of `text`, scanning from `from` (the end of the
/// argument list). Returns `None` when there is no top-level `AS`, when the
/// keyword is not followed by a literal, or when the literal is unterminated.
pub fn locate_body_literal(text: &str, from: usize) -> Option<BodyLiteral> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;

    for i in top_level_positions(text, from) {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b'A' | b'a' if depth == 0 && is_keyword_at(text, i, "AS") => {
                let literal_start = skip_whitespace(text, i + 2);
                return match bytes.get(literal_start) {
                    Some(b'$') => read_dollar_body(text, literal_start),
                    Some(b'\'') => read_quoted_body(text, literal_start),
                    _ => None,
                };
            }
            _ => {}
        }
    }
    None
}

fn read_dollar_body(text: &str, start: usize) -> Option<BodyLiteral> {
    let tag = dollar_tag_at(text, start)?;
    let content_start = start + tag.len();
    let closing = content_start + text[content_start..].find(tag)?;
    let end = closing + tag.len();

    Some(BodyLiteral {
        span: start..end,
        delimiter: LiteralDelimiter::Dollar {
            tag: tag.to_string(),
        },
        body_text: trim_blank_lines(&text[content_start..closing]).to_string(),
    })
}

fn read_quoted_body(text: &str, start: usize) -> Option<BodyLiteral> {
    let first = read_single_quoted(text, start)?;
    let mut end = first.end;
    let mut has_link_symbol = false;

    let cursor = skip_whitespace(text, first.end);
    if text.as_bytes().get(cursor) == Some(&b',') {
        let second_start = skip_whitespace(text, cursor + 1);
        if text.as_bytes().get(second_start) == Some(&b'\'') {
            let second = read_single_quoted(text, second_start)?;
            end = second.end;
            has_link_symbol = true;
        }
    }

    Some(BodyLiteral {
        span: start..end,
        delimiter: LiteralDelimiter::SingleQuoted { has_link_symbol },
        body_text: trim_blank_lines(&first.content).to_string(),
    })
}

/// Reads a `'...'` literal starting at `start`, unescaping doubled quotes.
fn read_single_quoted(text: &str, start: usize) -> Option<QuotedLiteral> {
    let bytes = text.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(QuotedLiteral {
                end: i + 1,
                content: text[start + 1..i].replace("''", "'"),
            });
        }
        i += 1;
    }
    None
}
