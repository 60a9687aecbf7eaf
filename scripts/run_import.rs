#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::{Context, Result};
use clap::Parser;
use groomdb::{
    archive_logs, db, logging, prune_run_dirs, run_import, run_log_dir, ImportOptions,
    OrphanFallbacks, TableProgress,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "import", about = "groomdb legacy database import")]
struct Cli {
    /// Staging database holding the extracted legacy dump (read-only)
    #[arg(long, value_name = "PATH")]
    staging: PathBuf,

    /// Destination database; created with the groomdb schema if absent
    #[arg(long, value_name = "PATH")]
    dest: Option<PathBuf>,

    /// Base directory for audit logs (a timestamped run directory is
    /// created underneath)
    #[arg(long, value_name = "PATH")]
    log_dir: Option<PathBuf>,

    /// Progress output cadence in records
    #[arg(long, value_name = "N", default_value_t = 100)]
    progress_every: u64,

    /// Keep at most this many previous run directories
    #[arg(long, value_name = "N", default_value_t = 10)]
    retention: usize,

    /// Substitute breed id for animals with a 0 breed reference
    #[arg(long, value_name = "ID")]
    fallback_breed: Option<i64>,

    /// Zip the run's logs after completion
    #[arg(long)]
    archive: bool,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| std::env::current_dir().expect("current dir"))
        .join("groomdb")
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let dest_path = cli
        .dest
        .unwrap_or_else(|| default_data_dir().join("groomdb.sqlite3"));
    let log_base = cli
        .log_dir
        .unwrap_or_else(|| default_data_dir().join("logs").join("import"));

    let staging_pool = db::open_sqlite_pool(&cli.staging, false)
        .await
        .with_context(|| format!("open staging database {}", cli.staging.display()))?;
    let dest_pool = db::open_sqlite_pool(&dest_path, true)
        .await
        .with_context(|| format!("open destination database {}", dest_path.display()))?;
    db::ensure_schema(&dest_pool)
        .await
        .context("apply destination schema")?;

    let mut options = ImportOptions::new(run_log_dir(&log_base));
    options.progress_every = cli.progress_every;
    options.orphan_fallbacks = OrphanFallbacks {
        breed: cli.fallback_breed,
        ..OrphanFallbacks::default()
    };

    let progress = |tick: TableProgress| {
        eprintln!("{}: {}/{}", tick.table, tick.processed, tick.total);
    };
    let summary = run_import(&staging_pool, &dest_pool, &options, Some(&progress)).await?;

    prune_run_dirs(&log_base, cli.retention);
    if cli.archive {
        let result = archive_logs(&options.log_dir)?;
        eprintln!(
            "archived {} log files to {}",
            result.file_count,
            result.zip_path.display()
        );
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
