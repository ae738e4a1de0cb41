//! Shared utility helpers.

/// Case-insensitive starts_with check without allocating.
#[inline]
pub fn starts_with_ci(haystack: &str, needle: &str) -> bool {
    haystack.len() >= needle.len()
        && haystack.as_bytes()[..needle.len()].eq_ignore_ascii_case(needle.as_bytes())
}

/// True for bytes that may appear inside an unquoted identifier or dollar-quote tag.
#[inline]
pub fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Checks whether `keyword` starts at `index` as a standalone word (case-insensitive).
pub fn is_keyword_at(text: &str, index: usize, keyword: &str) -> bool {
    let bytes = text.as_bytes();
    if !text.is_char_boundary(index) || !starts_with_ci(&text[index..], keyword) {
        return false;
    }
    let before_ok = index == 0 || !is_identifier_byte(bytes[index - 1]);
    let after_ok = bytes
        .get(index + keyword.len())
        .map_or(true, |b| !is_identifier_byte(*b));
    before_ok && after_ok
}

/// Index of the first non-whitespace byte at or after `index`.
pub fn skip_whitespace(text: &str, index: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = index;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Removes whole blank lines from both ends of `text`.
///
/// Whitespace before the first visible character is dropped only up to (and
/// including) the last line break in it, so the indentation of the first real
/// line survives. At the end, everything from the first line break of the
/// trailing whitespace onwards is dropped.
pub fn trim_blank_lines(text: &str) -> &str {
    let is_break = |c: char| c == '\n' || c == '\r';

    let leading = text.len() - text.trim_start().len();
    let start = text[..leading].rfind(is_break).map_or(0, |i| i + 1);

    let trimmed_end = text.trim_end().len().max(start);
    let end = text[trimmed_end..]
        .find(is_break)
        .map_or(text.len(), |i| trimmed_end + i);

    &text[start..end]
}

/// Collapses every whitespace run into a single space and trims both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Line terminator convention of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    CrLf,
    Lf,
    Cr,
}

impl LineEnding {
    /// Infers the convention by checking for `\r\n`, then `\n`, then `\r`.
    /// Text without any line break is treated as `\n`.
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else if text.contains('\n') {
            LineEnding::Lf
        } else if text.contains('\r') {
            LineEnding::Cr
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::CrLf => "\r\n",
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
        }
    }

    /// Converts `\n`-normalized text to this convention.
    pub fn apply(self, normalized: &str) -> String {
        match self {
            LineEnding::Lf => normalized.to_string(),
            other => normalized.replace('\n', other.as_str()),
        }
    }
}

/// Rewrites `\r\n` and lone `\r` line breaks as `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}
