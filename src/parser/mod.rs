//! PostgreSQL routine definition parsing

mod body;
mod clauses;
mod correlation;
mod definition;
mod identifier_utils;
pub mod scan;
mod statement;

pub use body::{locate_body_literal, BodyLiteral, LiteralDelimiter};
pub use clauses::{extract_options, ExtractedOptions};
pub use correlation::{braced_guid, canonical_guid, extract_correlation_id, same_guid};
pub use definition::{
    parse_definition, FunctionAttributes, Language, ParallelSafety, ParsedDefinition,
    RoutineAttributes, RoutineKind, Volatility,
};
pub use identifier_utils::{parse_qualified_name, unquote_identifier, QualifiedName};
pub use statement::{locate_create, locate_trailing_comment, CreateKeyword, TrailingComment};
