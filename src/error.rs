//! Error types for pg-funcsync
//!
//! Parsing never fails with an error: an unrecognised definition is `None`.
//! These errors cover the file and catalog side of synchronization.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while synchronizing SQL files with a catalog
#[derive(Error, Debug)]
pub enum FuncSyncError {
    #[error("Failed to read SQL file: {path}")]
    SqlFileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write SQL file: {path}")]
    SqlFileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file pattern: {pattern}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to traverse directory: {path}")]
    DirectoryWalkError {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Catalog entry not found: {id}")]
    CatalogEntryNotFound { id: String },
}
