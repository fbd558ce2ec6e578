use regmig_storage::StorageError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("query failed: {0}")]
    Query(#[source] StorageError),
    #[error("transaction failed: {0}")]
    Transaction(#[source] StorageError),
    #[error("failed to encode docker config: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("repository not found in target: {0}")]
    NotFound(String),
}

impl MigrateError {
    /// Hard failures abort the migration. The others only skip one repository.
    pub fn is_hard(&self) -> bool {
        matches!(self, MigrateError::Query(_) | MigrateError::Transaction(_))
    }
}

/// Why a repository was left out of an otherwise successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Encoding(String),
    NotFound,
    Lookup(String),
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Encoding(_) => "encoding",
            SkipReason::NotFound => "not_found",
            SkipReason::Lookup(_) => "lookup",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Encoding(detail) => write!(f, "encoding failed: {detail}"),
            SkipReason::NotFound => f.write_str("repository not found in target"),
            SkipReason::Lookup(detail) => write!(f, "repository lookup failed: {detail}"),
        }
    }
}

impl From<&MigrateError> for SkipReason {
    fn from(err: &MigrateError) -> Self {
        match err {
            MigrateError::Encoding(inner) => SkipReason::Encoding(inner.to_string()),
            MigrateError::NotFound(_) => SkipReason::NotFound,
            MigrateError::Query(inner) | MigrateError::Transaction(inner) => {
                SkipReason::Lookup(inner.to_string())
            }
        }
    }
}
