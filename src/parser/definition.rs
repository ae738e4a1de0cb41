//! Parsed routine definitions and the top-level parse entry point.

use std::fmt;

use super::body::{locate_body_literal, BodyLiteral};
use super::clauses::extract_options;
use super::correlation::extract_correlation_id;
use super::identifier_utils::parse_qualified_name;
use super::scan::{find_balanced_parens, find_statement_end, find_top_level_char};
use super::statement::{locate_create, locate_trailing_comment};
use crate::util::{normalize_line_endings, trim_blank_lines};

/// Kind of routine being defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineKind {
    Function,
    Procedure,
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutineKind::Function => write!(f, "FUNCTION"),
            RoutineKind::Procedure => write!(f, "PROCEDURE"),
        }
    }
}

/// Implementation language of a routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Language {
    Sql,
    C,
    Internal,
    PlPgSql,
    /// Any other language. Holds the declared token, or `None` when the
    /// definition has no `LANGUAGE` clause at all.
    UserDefined(Option<String>),
}

impl Language {
    /// Maps a `LANGUAGE` token (already unquoted) to a language, ignoring case.
    pub fn resolve(token: Option<&str>) -> Self {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Language::UserDefined(None),
        };
        match token.to_ascii_lowercase().as_str() {
            "sql" => Language::Sql,
            "c" => Language::C,
            "internal" => Language::Internal,
            "plpgsql" => Language::PlPgSql,
            _ => Language::UserDefined(Some(token.to_string())),
        }
    }

    /// Canonical tag: `sql`, `c`, `internal`, `plpgsql` or `user-defined`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Sql => "sql",
            Language::C => "c",
            Language::Internal => "internal",
            Language::PlPgSql => "plpgsql",
            Language::UserDefined(_) => "user-defined",
        }
    }

    /// The original token of a user-defined language.
    pub fn user_defined_name(&self) -> Option<&str> {
        match self {
            Language::UserDefined(name) => name.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user_defined_name() {
            Some(name) => write!(f, "{} ({})", self.as_str(), name),
            None => write!(f, "{}", self.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Volatility {
    Immutable,
    Stable,
    #[default]
    Volatile,
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Volatility::Immutable => write!(f, "IMMUTABLE"),
            Volatility::Stable => write!(f, "STABLE"),
            Volatility::Volatile => write!(f, "VOLATILE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParallelSafety {
    Safe,
    Restricted,
    #[default]
    Unsafe,
}

impl fmt::Display for ParallelSafety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParallelSafety::Safe => write!(f, "SAFE"),
            ParallelSafety::Restricted => write!(f, "RESTRICTED"),
            ParallelSafety::Unsafe => write!(f, "UNSAFE"),
        }
    }
}

/// Attributes that only exist for functions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionAttributes {
    pub volatility: Volatility,
    pub is_leakproof: bool,
    pub is_strict: bool,
    pub cost: Option<String>,
    pub rows: Option<String>,
    pub is_window: bool,
    pub parallel: ParallelSafety,
}

/// Kind-specific attributes. Procedures carry none of the function options,
/// even when the source text spells some of them out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutineAttributes {
    Function(FunctionAttributes),
    Procedure,
}

/// Structured metadata of one `CREATE FUNCTION|PROCEDURE` script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDefinition {
    /// The unmodified input.
    pub raw_text: String,
    /// Text before `CREATE`, blank lines trimmed.
    pub before_text: String,
    /// Text after the statement (or after its trailing comment), blank lines trimmed.
    pub after_text: String,
    pub schema: Option<String>,
    pub name: String,
    /// `schema.name`, or `name` when there is no schema.
    pub qualified_name: String,
    /// Text between the argument parentheses, `\n` line endings.
    pub argument_list: String,
    /// `RETURNS` payload, empty when absent.
    pub returns: String,
    pub language: Language,
    pub is_security_definer: bool,
    pub attributes: RoutineAttributes,
    /// Body literal; its span indexes into `raw_text`.
    pub body_literal: BodyLiteral,
    /// Unwrapped `COMMENT ON ... IS` literal, `\n` line endings.
    pub trailing_comment: Option<String>,
    /// First `@GUID {...}` found anywhere in `raw_text`.
    pub correlation_id: Option<String>,
}

impl ParsedDefinition {
    pub fn kind(&self) -> RoutineKind {
        match self.attributes {
            RoutineAttributes::Function(_) => RoutineKind::Function,
            RoutineAttributes::Procedure => RoutineKind::Procedure,
        }
    }

    pub fn function_attributes(&self) -> Option<&FunctionAttributes> {
        match &self.attributes {
            RoutineAttributes::Function(attrs) => Some(attrs),
            RoutineAttributes::Procedure => None,
        }
    }

    /// Body with its delimiters stripped and surrounding blank lines removed.
    pub fn body_text(&self) -> &str {
        &self.body_literal.body_text
    }

    /// The body literal exactly as written, delimiters included.
    pub fn body_literal_text(&self) -> &str {
        &self.raw_text[self.body_literal.span.clone()]
    }

    /// Rebuilds the raw text with the body literal replaced by `replacement`.
    pub fn splice_body_literal(&self, replacement: &str) -> String {
        let span = &self.body_literal.span;
        let mut out = String::with_capacity(self.raw_text.len() + replacement.len());
        out.push_str(&self.raw_text[..span.start]);
        out.push_str(replacement);
        out.push_str(&self.raw_text[span.end..]);
        out
    }
}

/// Parses the first `CREATE [OR REPLACE] FUNCTION|PROCEDURE` statement in `text`.
///
/// Returns `None` when no such statement is recognised or when it cannot be
/// delimited (no argument list, unbalanced parentheses, no `AS` literal,
/// unterminated literal). That is an ordinary negative result, not an error.
pub fn parse_definition(text: &str) -> Option<ParsedDefinition> {
    let create = locate_create(text)?;

    let comment = locate_trailing_comment(text, create.start);
    let (definition_end, after_start) = match &comment {
        Some(comment) => (comment.start, comment.end),
        None => {
            let end = find_statement_end(text, create.start).unwrap_or(text.len());
            (end, end)
        }
    };
    let trailing_comment = comment.map(|c| c.text);
    let statement = &text[create.start..definition_end];

    let name_start = create.after_keyword - create.start;
    let open_paren = find_top_level_char(statement, b'(', name_start)?;
    let name = parse_qualified_name(&statement[name_start..open_paren]);
    let args = find_balanced_parens(statement, open_paren)?;

    let mut body_literal = locate_body_literal(statement, args.end)?;
    let options_segment = format!(
        "{} {}",
        &statement[args.end..body_literal.span.start],
        &statement[body_literal.span.end..]
    );
    let options = extract_options(&options_segment);

    body_literal.span =
        create.start + body_literal.span.start..create.start + body_literal.span.end;

    let attributes = match create.kind {
        RoutineKind::Function => RoutineAttributes::Function(FunctionAttributes {
            volatility: options.volatility,
            is_leakproof: options.is_leakproof,
            is_strict: options.is_strict,
            cost: options.cost,
            rows: options.rows,
            is_window: options.is_window,
            parallel: options.parallel,
        }),
        RoutineKind::Procedure => RoutineAttributes::Procedure,
    };

    let argument_list = normalize_line_endings(&statement[args.content.clone()]);

    Some(ParsedDefinition {
        raw_text: text.to_string(),
        before_text: trim_blank_lines(&text[..create.start]).to_string(),
        after_text: trim_blank_lines(&text[after_start..]).to_string(),
        qualified_name: name.qualified(),
        schema: name.schema,
        name: name.name,
        argument_list: trim_blank_lines(&argument_list).to_string(),
        returns: options.returns,
        language: options.language,
        is_security_definer: options.is_security_definer,
        attributes,
        body_literal,
        trailing_comment,
        correlation_id: extract_correlation_id(text),
    })
}
