//! Synchronization of a folder tree of routine scripts with a catalog.
//!
//! Every matching file is parsed, upserted into the catalog and, when the
//! catalog hands back a different identifier than the one embedded in the
//! file, rewritten with [`ensure_marker`](crate::marker::ensure_marker).
//! Catalog entries whose identifier no longer appears in any file are removed.

mod catalog;
mod files;

pub use catalog::{
    fingerprint, Catalog, CatalogEntry, CatalogUpsert, InMemoryCatalog, UpsertOutcome,
};
pub use files::{collect_sql_files, SourceEncoding, SqlFile};

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use glob::Pattern;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::FuncSyncError;
use crate::marker::ensure_marker;
use crate::parser::{canonical_guid, parse_definition, same_guid, ParsedDefinition};

/// Minimum number of files before parsing goes through rayon.
const PARALLEL_THRESHOLD: usize = 8;

/// Options for a sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Database library root, e.g. `db-lib`
    pub root: PathBuf,
    /// Sub-folders of `root` holding routine scripts
    pub folders: Vec<String>,
    /// File name glob
    pub pattern: String,
    /// Update the catalog but leave files untouched
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("db-lib"),
            folders: vec!["functions".to_string(), "procedures".to_string()],
            pattern: "*.sql".to_string(),
            dry_run: false,
        }
    }
}

/// Outcome of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub files_scanned: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Files whose marker was (or, on a dry run, would be) rewritten
    pub rewritten: Vec<PathBuf>,
    /// Files without a recognisable definition
    pub skipped: Vec<PathBuf>,
    /// Catalog identifiers removed because no file carries them any more
    pub removed: Vec<String>,
}

/// Synchronizes every routine script under `options.root` with `catalog`.
///
/// Files that hold no parseable definition are logged and skipped. I/O and
/// catalog failures abort the run.
pub fn sync_directory(options: &SyncOptions, catalog: &mut dyn Catalog) -> Result<SyncReport> {
    let pattern =
        Pattern::new(&options.pattern).map_err(|source| FuncSyncError::InvalidPattern {
            pattern: options.pattern.clone(),
            source,
        })?;

    let mut report = SyncReport::default();
    let mut seen_ids = HashSet::new();

    for folder in &options.folders {
        let dir = options.root.join(folder);
        if !dir.is_dir() {
            warn!(path = %dir.display(), "Folder not found, skipping");
            continue;
        }

        let paths = collect_sql_files(&dir, &pattern)?;
        info!(folder = %folder, files = paths.len(), "Synchronizing folder");

        for (file, definition) in read_and_parse(&paths)? {
            report.files_scanned += 1;

            let Some(definition) = definition else {
                warn!(
                    path = %file.path.display(),
                    "No CREATE FUNCTION or CREATE PROCEDURE statement found, skipping"
                );
                report.skipped.push(file.path);
                continue;
            };
            debug!(
                path = %file.path.display(),
                kind = %definition.kind(),
                name = %definition.qualified_name,
                "Parsed definition"
            );

            let upsert = catalog.upsert(&definition)?;
            match upsert.outcome {
                UpsertOutcome::Created => report.created += 1,
                UpsertOutcome::Updated => report.updated += 1,
                UpsertOutcome::Unchanged => report.unchanged += 1,
            }
            if let Some(id) = canonical_guid(&upsert.id) {
                seen_ids.insert(id);
            }

            let marker_matches = definition
                .correlation_id
                .as_deref()
                .is_some_and(|current| same_guid(current, &upsert.id));
            if marker_matches {
                continue;
            }

            let updated = ensure_marker(&file.content, &upsert.id);
            if updated == file.content {
                warn!(
                    path = %file.path.display(),
                    id = %upsert.id,
                    "Could not place identifier marker"
                );
                continue;
            }
            if !options.dry_run {
                file.write(&updated)?;
            }
            debug!(path = %file.path.display(), id = %upsert.id, "Marker updated");
            report.rewritten.push(file.path);
        }
    }

    // Nothing seen means nothing to compare against; never empty the catalog.
    if !seen_ids.is_empty() {
        for id in catalog.ids() {
            let orphaned = canonical_guid(&id).map_or(true, |bare| !seen_ids.contains(&bare));
            if orphaned {
                info!(id = %id, "Removing catalog entry without source file");
                catalog.remove(&id)?;
                report.removed.push(id);
            }
        }
    }

    info!(
        scanned = report.files_scanned,
        created = report.created,
        updated = report.updated,
        unchanged = report.unchanged,
        rewritten = report.rewritten.len(),
        skipped = report.skipped.len(),
        removed = report.removed.len(),
        "Sync complete"
    );

    Ok(report)
}

/// Reads and parses files, in parallel for larger folders. Order follows `paths`.
fn read_and_parse(
    paths: &[PathBuf],
) -> Result<Vec<(SqlFile, Option<ParsedDefinition>)>, FuncSyncError> {
    let load = |path: &PathBuf| {
        SqlFile::read(path).map(|file| {
            let definition = parse_definition(&file.content);
            (file, definition)
        })
    };

    if paths.len() >= PARALLEL_THRESHOLD {
        paths.par_iter().map(load).collect()
    } else {
        paths.iter().map(load).collect()
    }
}
