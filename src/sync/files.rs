//! SQL source file access: discovery, decoding and write-back.

use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1252;
use glob::Pattern;
use walkdir::WalkDir;

use crate::error::FuncSyncError;

const UTF8_BOM: char = '\u{FEFF}';

/// Encoding a file was read with, so it can be written back the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8 { bom: bool },
    Windows1252,
}

/// A decoded SQL source file.
#[derive(Debug, Clone)]
pub struct SqlFile {
    pub path: PathBuf,
    /// Decoded text without BOM.
    pub content: String,
    pub encoding: SourceEncoding,
}

impl SqlFile {
    /// Reads a file as UTF-8, falling back to Windows-1252 (common for SQL
    /// files created on Windows).
    pub fn read(path: &Path) -> Result<Self, FuncSyncError> {
        let bytes = std::fs::read(path).map_err(|source| FuncSyncError::SqlFileReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let (content, encoding) = match String::from_utf8(bytes) {
            Ok(text) => match text.strip_prefix(UTF8_BOM) {
                Some(stripped) => (stripped.to_string(), SourceEncoding::Utf8 { bom: true }),
                None => (text, SourceEncoding::Utf8 { bom: false }),
            },
            Err(err) => {
                // Windows-1252 maps every byte, so this decode cannot fail
                let (decoded, _, _) = WINDOWS_1252.decode(err.as_bytes());
                (decoded.into_owned(), SourceEncoding::Windows1252)
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            content,
            encoding,
        })
    }

    /// Replaces the file's content, keeping its original encoding and BOM.
    pub fn write(&self, content: &str) -> Result<(), FuncSyncError> {
        let bytes = match self.encoding {
            SourceEncoding::Utf8 { bom: true } => format!("{UTF8_BOM}{content}").into_bytes(),
            SourceEncoding::Utf8 { bom: false } => content.as_bytes().to_vec(),
            SourceEncoding::Windows1252 => WINDOWS_1252.encode(content).0.into_owned(),
        };
        std::fs::write(&self.path, bytes).map_err(|source| FuncSyncError::SqlFileWriteError {
            path: self.path.clone(),
            source,
        })
    }
}

/// All files under `dir` whose file name matches `pattern`, sorted by path.
pub fn collect_sql_files(dir: &Path, pattern: &Pattern) -> Result<Vec<PathBuf>, FuncSyncError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| FuncSyncError::DirectoryWalkError {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| pattern.matches(name));
        if matches {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
