//! Lexical scan context for PostgreSQL DDL text
//!
//! Classifies every byte position of a script as top-level (normal) text or as
//! part of a comment, string literal, quoted identifier or dollar-quoted span.
//! All structural searches in the parser go through this module, so a keyword,
//! parenthesis or semicolon inside `-- ...`, `/* ... */`, `'...'`, `"..."` or
//! `$tag$...$tag$` never counts as structure.
//!
//! Transition priority in normal mode:
//! 1. `--` opens a line comment (closed by `\n` or `\r`)
//! 2. `/*` opens a block comment (closed by the next `*/`, no nesting)
//! 3. `$tag$` opens a dollar-quoted span (closed by the identical tag)
//! 4. `'` opens a string literal (`''` is an escaped quote)
//! 5. `"` opens a quoted identifier (closed by the next `"`)
//!
//! Scanning is byte oriented. Every delimiter is ASCII, so multi-byte UTF-8
//! sequences are never mistaken for structure.

use std::borrow::Cow;
use std::ops::Range;

use crate::util::is_identifier_byte;

/// Scanner state. The dollar-quote variant remembers its exact delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode<'a> {
    Normal,
    LineComment,
    BlockComment,
    SingleQuoted,
    DoubleQuoted,
    DollarQuoted(&'a str),
}

/// Result of advancing the scanner over one position.
///
/// `skip` is the number of bytes consumed as a unit (an opening `--`, a
/// closing `*/`, a whole dollar tag, an escaped `''`). Zero means the position
/// was consumed on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step<'a> {
    pub mode: ScanMode<'a>,
    pub skip: usize,
}

impl<'a> Step<'a> {
    fn to(mode: ScanMode<'a>) -> Self {
        Step { mode, skip: 0 }
    }

    fn consuming(mode: ScanMode<'a>, skip: usize) -> Self {
        Step { mode, skip }
    }
}

impl<'a> ScanMode<'a> {
    /// Computes the state after looking at `text[index]` in this state.
    pub fn advance(self, text: &'a str, index: usize) -> Step<'a> {
        let bytes = text.as_bytes();
        let ch = bytes[index];
        let next = bytes.get(index + 1).copied();

        match self {
            ScanMode::LineComment => {
                if ch == b'\n' || ch == b'\r' {
                    Step::to(ScanMode::Normal)
                } else {
                    Step::to(self)
                }
            }
            ScanMode::BlockComment => {
                if ch == b'*' && next == Some(b'/') {
                    Step::consuming(ScanMode::Normal, 2)
                } else {
                    Step::to(self)
                }
            }
            ScanMode::DollarQuoted(tag) => {
                if bytes[index..].starts_with(tag.as_bytes()) {
                    Step::consuming(ScanMode::Normal, tag.len())
                } else {
                    Step::to(self)
                }
            }
            ScanMode::SingleQuoted => match (ch, next) {
                (b'\'', Some(b'\'')) => Step::consuming(self, 2),
                (b'\'', _) => Step::to(ScanMode::Normal),
                _ => Step::to(self),
            },
            ScanMode::DoubleQuoted => {
                if ch == b'"' {
                    Step::to(ScanMode::Normal)
                } else {
                    Step::to(self)
                }
            }
            ScanMode::Normal => match (ch, next) {
                (b'-', Some(b'-')) => Step::consuming(ScanMode::LineComment, 2),
                (b'/', Some(b'*')) => Step::consuming(ScanMode::BlockComment, 2),
                (b'$', _) => match dollar_tag_at(text, index) {
                    Some(tag) => Step::consuming(ScanMode::DollarQuoted(tag), tag.len()),
                    None => Step::to(self),
                },
                (b'\'', _) => Step::to(ScanMode::SingleQuoted),
                (b'"', _) => Step::to(ScanMode::DoubleQuoted),
                _ => Step::to(self),
            },
        }
    }

    #[inline]
    pub fn is_top_level(self) -> bool {
        self == ScanMode::Normal
    }

    #[inline]
    pub fn is_comment(self) -> bool {
        matches!(self, ScanMode::LineComment | ScanMode::BlockComment)
    }
}

/// Reads a dollar-quote delimiter (`$`, optional identifier characters, `$`)
/// starting at `index`.
pub fn dollar_tag_at(text: &str, index: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(index) != Some(&b'$') {
        return None;
    }
    let mut end = index + 1;
    while end < bytes.len() && is_identifier_byte(bytes[end]) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'$') {
        Some(&text[index..=end])
    } else {
        None
    }
}

/// Iterator over the top-level byte positions of a text, starting from a fresh
/// scan context at a given offset.
pub struct TopLevelPositions<'a> {
    text: &'a str,
    index: usize,
    mode: ScanMode<'a>,
}

impl<'a> Iterator for TopLevelPositions<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.index < self.text.len() {
            let i = self.index;
            let step = self.mode.advance(self.text, i);
            self.mode = step.mode;
            if step.skip > 0 {
                self.index = i + step.skip;
                continue;
            }
            self.index = i + 1;
            if self.mode.is_top_level() {
                return Some(i);
            }
        }
        None
    }
}

/// Positions of `text` at or after `from` that are outside comments and literals.
pub fn top_level_positions(text: &str, from: usize) -> TopLevelPositions<'_> {
    TopLevelPositions {
        text,
        index: from,
        mode: ScanMode::Normal,
    }
}

/// Whether `offset` is a top-level position when scanning `text` from the start.
pub fn is_top_level_at(text: &str, offset: usize) -> bool {
    top_level_positions(text, 0)
        .take_while(|&i| i <= offset)
        .any(|i| i == offset)
}

/// Index of the first top-level occurrence of `target` at or after `from`.
pub fn find_top_level_char(text: &str, target: u8, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    top_level_positions(text, from).find(|&i| bytes[i] == target)
}

/// Span of a balanced parenthesised group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParenSpan {
    /// Byte range of the text between the outer parentheses.
    pub content: Range<usize>,
    /// Index just past the matching close parenthesis.
    pub end: usize,
}

/// Finds the parenthesis matching the top-level `(` at `open_index`.
///
/// Returns `None` when the text ends before the group is closed.
pub fn find_balanced_parens(text: &str, open_index: usize) -> Option<ParenSpan> {
    let bytes = text.as_bytes();
    let mut depth = 1usize;
    for i in top_level_positions(text, open_index + 1) {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(ParenSpan {
                        content: open_index + 1..i,
                        end: i + 1,
                    });
                }
            }
            _ => {}
        }
    }
    None
}

/// Index just past the first top-level `;` at or after `from`.
pub fn find_statement_end(text: &str, from: usize) -> Option<usize> {
    find_top_level_char(text, b';', from).map(|i| i + 1)
}

/// Byte ranges covered by line and block comments, delimiters included.
///
/// A line comment's range stops before its terminating line break. An
/// unterminated comment runs to the end of the text.
pub fn comment_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut mode = ScanMode::Normal;
    let mut open: Option<usize> = None;
    let mut index = 0;

    while index < text.len() {
        let was_comment = mode.is_comment();
        let step = mode.advance(text, index);
        let is_comment = step.mode.is_comment();

        if !was_comment && is_comment {
            open = Some(index);
        } else if was_comment && !is_comment {
            if let Some(start) = open.take() {
                spans.push(start..index + step.skip);
            }
        }

        mode = step.mode;
        index += step.skip.max(1);
    }

    if let Some(start) = open {
        spans.push(start..text.len());
    }
    spans
}

/// Replaces every comment with spaces of the same byte length, so offsets
/// into the result still line up with `text`.
pub fn mask_comments(text: &str) -> Cow<'_, str> {
    let spans = comment_spans(text);
    if spans.is_empty() {
        return Cow::Borrowed(text);
    }

    let mut masked = String::with_capacity(text.len());
    let mut last = 0;
    for span in spans {
        masked.push_str(&text[last..span.start]);
        masked.extend(std::iter::repeat(' ').take(span.len()));
        last = span.end;
    }
    masked.push_str(&text[last..]);
    Cow::Owned(masked)
}
