//! Catalog collaborator: the store that owns authoritative routine identifiers.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::FuncSyncError;
use crate::parser::{
    canonical_guid, extract_correlation_id, Language, ParsedDefinition, RoutineKind,
};
use crate::util::normalize_line_endings;

/// What an upsert did to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Result of reconciling one definition with the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogUpsert {
    /// Authoritative identifier, braced upper-case form.
    pub id: String,
    pub outcome: UpsertOutcome,
}

/// A store of routine entries keyed by correlation identifier.
pub trait Catalog {
    /// Creates or updates the entry for `definition` and returns the
    /// identifier the source file should carry.
    fn upsert(&mut self, definition: &ParsedDefinition) -> Result<CatalogUpsert, FuncSyncError>;

    /// Identifiers of every entry, braced form.
    fn ids(&self) -> Vec<String>;

    fn remove(&mut self, id: &str) -> Result<(), FuncSyncError>;
}

/// Catalog-side copy of a parsed definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub kind: RoutineKind,
    pub schema: Option<String>,
    pub name: String,
    pub qualified_name: String,
    pub argument_list: String,
    pub returns: String,
    pub language: Language,
    pub comment: Option<String>,
    /// SHA-256 over the definition with marker lines left out.
    pub fingerprint: String,
}

impl CatalogEntry {
    pub fn from_definition(id: String, definition: &ParsedDefinition) -> Self {
        Self {
            id,
            kind: definition.kind(),
            schema: definition.schema.clone(),
            name: definition.name.clone(),
            qualified_name: definition.qualified_name.clone(),
            argument_list: definition.argument_list.clone(),
            returns: definition.returns.clone(),
            language: definition.language.clone(),
            comment: definition.trailing_comment.clone(),
            fingerprint: fingerprint(definition),
        }
    }
}

/// Hashes a definition so that adding or changing its `@GUID` marker does not
/// count as a change.
pub fn fingerprint(definition: &ParsedDefinition) -> String {
    let mut hasher = Sha256::new();
    hasher.update(definition.kind().to_string());
    hasher.update([0u8]);
    hasher.update(&definition.qualified_name);
    hasher.update([0u8]);
    hasher.update(&definition.argument_list);
    hasher.update([0u8]);
    hasher.update(&definition.returns);
    hasher.update([0u8]);
    hasher.update(definition.language.to_string());
    hasher.update([0u8]);
    if let Some(attrs) = definition.function_attributes() {
        hasher.update(format!("{attrs:?}"));
    }
    hasher.update([0u8]);
    hasher.update(definition.is_security_definer.to_string());
    hasher.update([0u8]);
    for line in normalize_line_endings(definition.body_text()).lines() {
        if extract_correlation_id(line).is_none() {
            hasher.update(line);
            hasher.update([b'\n']);
        }
    }
    hasher.update([0u8]);
    if let Some(comment) = &definition.trailing_comment {
        hasher.update(comment);
    }
    hex::encode(hasher.finalize())
}

/// In-memory catalog.
///
/// A definition whose marker is unknown to the catalog keeps that identifier;
/// a definition without a usable marker (or whose identifier is taken by a
/// routine of the other kind) gets a fresh random one.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.get(&canonical_guid(id)?)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fresh_id() -> String {
        Uuid::new_v4().to_string().to_ascii_uppercase()
    }
}

impl Catalog for InMemoryCatalog {
    fn upsert(&mut self, definition: &ParsedDefinition) -> Result<CatalogUpsert, FuncSyncError> {
        let requested = definition
            .correlation_id
            .as_deref()
            .and_then(canonical_guid);

        if let Some(existing) = requested.as_ref().and_then(|key| self.entries.get_mut(key)) {
            if existing.kind == definition.kind() {
                let entry = CatalogEntry::from_definition(existing.id.clone(), definition);
                let outcome = if existing.fingerprint == entry.fingerprint {
                    UpsertOutcome::Unchanged
                } else {
                    UpsertOutcome::Updated
                };
                *existing = entry;
                return Ok(CatalogUpsert {
                    id: existing.id.clone(),
                    outcome,
                });
            }
        }

        let key = requested
            .filter(|key| !self.entries.contains_key(key))
            .unwrap_or_else(Self::fresh_id);
        let id = format!("{{{key}}}");
        self.entries
            .insert(key, CatalogEntry::from_definition(id.clone(), definition));
        Ok(CatalogUpsert {
            id,
            outcome: UpsertOutcome::Created,
        })
    }

    fn ids(&self) -> Vec<String> {
        self.entries.values().map(|entry| entry.id.clone()).collect()
    }

    fn remove(&mut self, id: &str) -> Result<(), FuncSyncError> {
        let key = canonical_guid(id);
        match key.and_then(|key| self.entries.remove(&key)) {
            Some(_) => Ok(()),
            None => Err(FuncSyncError::CatalogEntryNotFound { id: id.to_string() }),
        }
    }
}
