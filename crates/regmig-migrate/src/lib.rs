//! Moves pre-1.0 registry credentials into 1.0 `.dockerconfigjson` secrets.
//!
//! Every repository with at least one legacy registry row gets exactly one
//! secret whose payload merges all of its registries. Secret identifiers are
//! assigned here, as a contiguous run starting right after the highest
//! identifier already present in the target database.
//!
//! Store failures abort the run and roll back the whole transaction.
//! Repositories that cannot be encoded or are unknown to the target are
//! skipped and reported instead.

mod error;
mod registries;

pub use error::{MigrateError, SkipReason};
pub use registries::{
    fetch_legacy_credentials, migrate_registries, MigrateOptions, MigratedSecret,
    MigrationReport, SkippedRepo,
};
