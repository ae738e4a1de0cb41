//! pg-funcsync: PostgreSQL routine definition parsing and identifier sync
//!
//! This library reads `CREATE [OR REPLACE] FUNCTION|PROCEDURE` scripts into
//! structured metadata, keeps an `@GUID {...}` correlation marker inside each
//! routine body, and synchronizes a folder of such scripts with a catalog.

pub mod error;
pub mod marker;
pub mod parser;
pub mod sync;
pub mod util;

pub use error::FuncSyncError;
pub use marker::ensure_marker;
pub use parser::{extract_correlation_id, parse_definition, ParsedDefinition};
pub use sync::{sync_directory, Catalog, InMemoryCatalog, SyncOptions, SyncReport};
