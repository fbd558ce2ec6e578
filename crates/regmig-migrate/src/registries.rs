use crate::error::{MigrateError, SkipReason};
use regmig_core::{group_by_repo, DockerConfig, LegacyCredential, Secret, SequenceMode};
use regmig_storage::{LegacyStore, SecretTransaction, TargetStore};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrateOptions {
    pub sequence: SequenceMode,
    /// Run every step, then roll back instead of committing.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratedSecret {
    pub secret_id: i64,
    pub repo_id: i64,
    pub repo_full_name: String,
    pub registries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRepo {
    pub repo_full_name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub legacy_rows: usize,
    pub repositories: usize,
    pub first_secret_id: i64,
    /// First identifier not handed out by this run.
    pub next_secret_id: i64,
    pub migrated: Vec<MigratedSecret>,
    pub skipped: Vec<SkippedRepo>,
    pub committed: bool,
}

pub fn fetch_legacy_credentials(
    source: &LegacyStore,
) -> Result<Vec<LegacyCredential>, MigrateError> {
    source.registry_credentials().map_err(|err| {
        error!(event = "legacy_query_failed", error = %err);
        MigrateError::Query(err)
    })
}

pub fn migrate_registries(
    source: &LegacyStore,
    target: &mut TargetStore,
    options: &MigrateOptions,
) -> Result<MigrationReport, MigrateError> {
    let credentials = fetch_legacy_credentials(source)?;
    info!(event = "migration_start", registries = credentials.len());

    for credential in &credentials {
        debug!(
            event = "prepare_registry",
            repo = %credential.repo_full_name,
            addr = %credential.addr
        );
    }
    let bundles = group_by_repo(&credentials);

    let tx = target.begin().map_err(MigrateError::Transaction)?;

    let watermark = tx.last_secret_id().map_err(|err| {
        error!(event = "secret_watermark_failed", error = %err);
        MigrateError::Query(err)
    })?;
    let first_secret_id = watermark + 1;
    let mut next_secret_id = first_secret_id;

    let mut report = MigrationReport {
        legacy_rows: credentials.len(),
        repositories: bundles.len(),
        first_secret_id,
        ..MigrationReport::default()
    };

    for (repo_full_name, config) in &bundles {
        debug!(event = "migrate_registry", repo = %repo_full_name);

        let (repo_id, data) = match prepare_secret(&tx, repo_full_name, config) {
            Ok(prepared) => prepared,
            Err(err) => {
                error!(event = "registry_skipped", repo = %repo_full_name, error = %err);
                report.skipped.push(SkippedRepo {
                    repo_full_name: repo_full_name.clone(),
                    reason: SkipReason::from(&err),
                });
                continue;
            }
        };

        let secret = Secret::docker_config(next_secret_id, repo_id, data);
        next_secret_id += 1;

        tx.insert_secret(&secret).map_err(|err| {
            error!(event = "migration_failed", repo = %repo_full_name, error = %err);
            MigrateError::Transaction(err)
        })?;

        debug!(event = "migration_complete", repo = %repo_full_name, secret_id = secret.id);
        report.migrated.push(MigratedSecret {
            secret_id: secret.id,
            repo_id,
            repo_full_name: repo_full_name.clone(),
            registries: config.auths.len(),
        });
    }
    report.next_secret_id = next_secret_id;

    if options.sequence.is_explicit() {
        tx.reset_secret_sequence(next_secret_id).map_err(|err| {
            error!(event = "sequence_reset_failed", error = %err);
            MigrateError::Transaction(err)
        })?;
    }

    if options.dry_run {
        drop(tx);
        info!(
            event = "dry_run_rolled_back",
            migrated = report.migrated.len(),
            skipped = report.skipped.len()
        );
        return Ok(report);
    }

    tx.commit().map_err(|err| {
        error!(event = "commit_failed", error = %err);
        MigrateError::Transaction(err)
    })?;
    report.committed = true;

    info!(
        event = "migration_finished",
        migrated = report.migrated.len(),
        skipped = report.skipped.len(),
        next_secret_id
    );
    Ok(report)
}

fn prepare_secret(
    tx: &SecretTransaction<'_>,
    repo_full_name: &str,
    config: &DockerConfig,
) -> Result<(i64, String), MigrateError> {
    let data = config.to_json()?;
    let repo_id = tx
        .repo_id_by_slug(repo_full_name)
        .map_err(MigrateError::Query)?
        .ok_or_else(|| MigrateError::NotFound(repo_full_name.to_string()))?;
    Ok((repo_id, data))
}
