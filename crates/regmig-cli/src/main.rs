use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use regmig_core::SequenceMode;
use regmig_migrate::{migrate_registries, MigrateError, MigrateOptions, MigrationReport};
use regmig_storage::{LegacyStore, TargetStore};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "regmig")]
#[command(about = "Migrate pre-1.0 registry credentials into 1.0 secrets", long_about = None)]
struct Cli {
    /// Enable debug logging (also REGMIG_DEBUG)
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge registry credentials into one .dockerconfigjson secret per repository
    Registries {
        /// Legacy database, opened read-only
        #[arg(long)]
        source: PathBuf,
        /// Target database
        #[arg(long)]
        target: PathBuf,
        /// Whether the target keeps a separate secrets id sequence (also REGMIG_SEQUENCE)
        #[arg(long, value_enum)]
        sequence: Option<SequenceArg>,
        /// Roll back instead of committing
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SequenceArg {
    Implicit,
    Explicit,
}

impl From<SequenceArg> for SequenceMode {
    fn from(arg: SequenceArg) -> Self {
        match arg {
            SequenceArg::Implicit => SequenceMode::Implicit,
            SequenceArg::Explicit => SequenceMode::Explicit,
        }
    }
}

#[derive(Clone, Debug)]
struct Config {
    source: PathBuf,
    target: PathBuf,
    debug: bool,
    options: MigrateOptions,
}

fn load_config(cli: Cli) -> Result<Config> {
    let debug = cli.debug || env_true("REGMIG_DEBUG");
    match cli.command {
        Commands::Registries {
            source,
            target,
            sequence,
            dry_run,
        } => {
            let sequence = resolve_sequence(sequence)?;
            Ok(Config {
                source,
                target,
                debug,
                options: MigrateOptions { sequence, dry_run },
            })
        }
    }
}

fn resolve_sequence(flag: Option<SequenceArg>) -> Result<SequenceMode> {
    if let Some(arg) = flag {
        return Ok(arg.into());
    }
    match std::env::var("REGMIG_SEQUENCE") {
        Ok(value) if !value.trim().is_empty() => value
            .parse::<SequenceMode>()
            .map_err(anyhow::Error::msg)
            .context("invalid REGMIG_SEQUENCE"),
        _ => Ok(SequenceMode::default()),
    }
}

fn init_logging(config: &Config) {
    let level = if config.debug {
        "debug".to_string()
    } else if let Ok(level) = std::env::var("REGMIG_LOG_LEVEL") {
        level
    } else {
        "info".to_string()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn env_true(key: &str) -> bool {
    match std::env::var(key) {
        Ok(value) => matches!(
            value.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => false,
    }
}

fn run(config: &Config) -> Result<MigrationReport> {
    let source = LegacyStore::open(&config.source)
        .with_context(|| format!("failed to open source {}", config.source.display()))?;
    let mut target = TargetStore::open(&config.target)
        .with_context(|| format!("failed to open target {}", config.target.display()))?;
    info!(
        event = "migration_config",
        source = %config.source.display(),
        target = %config.target.display(),
        sequence = %config.options.sequence,
        dry_run = config.options.dry_run
    );
    let report = migrate_registries(&source, &mut target, &config.options)
        .context("registry migration failed")?;
    Ok(report)
}

fn print_report(report: &MigrationReport) {
    println!(
        "Read {} registry rows for {} repositories",
        report.legacy_rows, report.repositories
    );
    for migrated in &report.migrated {
        println!(
            "- [{}] {} ({} registries)",
            migrated.secret_id, migrated.repo_full_name, migrated.registries
        );
    }
    for skipped in &report.skipped {
        println!("- skipped {}: {}", skipped.repo_full_name, skipped.reason);
    }
    if report.committed {
        println!(
            "Committed {} secrets, next secret id {}",
            report.migrated.len(),
            report.next_secret_id
        );
    } else {
        println!("Dry run, nothing committed");
    }
}

/// Failures that are not a [`MigrateError`] happen before the transaction
/// opens, so the target is untouched either way.
fn is_hard_failure(err: &anyhow::Error) -> bool {
    err.downcast_ref::<MigrateError>()
        .map(MigrateError::is_hard)
        .unwrap_or(true)
}

fn main() -> Result<()> {
    let config = load_config(Cli::parse())?;
    init_logging(&config);

    match run(&config) {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(err) => {
            let hard = is_hard_failure(&err);
            error!(event = "migration_aborted", hard, error = %format!("{err:#}"));
            if hard {
                eprintln!("Migration rolled back, target left unchanged");
            }
            Err(err)
        }
    }
}
