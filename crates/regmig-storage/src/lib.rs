use std::path::PathBuf;
use thiserror::Error;

mod legacy;
mod target;

pub use legacy::LegacyStore;
pub use target::{SecretTransaction, TargetStore};

/// Table whose identifiers are assigned by the migration.
pub const SECRETS_TABLE: &str = "secrets";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

fn table_exists(conn: &rusqlite::Connection, table_name: &str) -> Result<bool, StorageError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [table_name],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(exists == 1)
}
