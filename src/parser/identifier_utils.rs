//! Identifier handling for PostgreSQL routine names.
//!
//! # Examples
//!
//! ```ignore
//! use crate::parser::identifier_utils::*;
//!
//! assert_eq!(unquote_identifier("\"Member\""), "Member");
//!
//! let name = parse_qualified_name("public.\"Member\"");
//! assert_eq!(name.schema.as_deref(), Some("public"));
//! assert_eq!(name.name, "Member");
//! ```

use super::scan::find_top_level_char;

/// Strips one leading and one trailing double quote from an identifier.
pub fn unquote_identifier(ident: &str) -> String {
    let ident = ident.trim();
    let ident = ident.strip_prefix('"').unwrap_or(ident);
    ident.strip_suffix('"').unwrap_or(ident).to_string()
}

/// A schema-qualified name with quotes removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub schema: Option<String>,
    pub name: String,
}

impl QualifiedName {
    /// `schema.name`, or `name` when there is no schema.
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

/// Splits a name segment such as `public."MyFunc"` on its first `.` outside
/// double quotes and unquotes each part independently.
pub fn parse_qualified_name(segment: &str) -> QualifiedName {
    let segment = segment.trim();
    match find_top_level_char(segment, b'.', 0) {
        Some(dot) => QualifiedName {
            schema: Some(unquote_identifier(&segment[..dot])),
            name: unquote_identifier(&segment[dot + 1..]),
        },
        None => QualifiedName {
            schema: None,
            name: unquote_identifier(segment),
        },
    }
}
