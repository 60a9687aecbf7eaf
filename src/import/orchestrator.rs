//! Drives the whole run: tables in dependency order, one record at a time,
//! every outcome logged, progress reported outward.
//!
//! The run is deliberately serial. A child table's referential check needs
//! the complete accepted-ID set of its parents, inserts are serial writes,
//! and the audit log must stay in deterministic order. Nothing retries: a
//! failed insert is logged and the next record is attempted.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;

use super::identity::OrphanFallbacks;
use super::insert::insert_record;
use super::logger::{write_summary_report, ImportStats, ImportSummary, TableLogger};
use super::staging;
use super::table_order::{dependency_order, TableKind, ALL_TABLES};
use super::validate::{validate_record, ImportState, Validated};

pub const DEFAULT_PROGRESS_EVERY: u64 = 100;

/// Operator-facing configuration for one run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Directory the audit logs and summary report are written to.
    pub log_dir: PathBuf,
    /// Progress callback cadence in records.
    pub progress_every: u64,
    /// Substitute parents for the 0 sentinel; disabled by default.
    pub orphan_fallbacks: OrphanFallbacks,
}

impl ImportOptions {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            progress_every: DEFAULT_PROGRESS_EVERY,
            orphan_fallbacks: OrphanFallbacks::default(),
        }
    }
}

/// One progress tick, suitable for relaying over a push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableProgress {
    pub table: TableKind,
    pub processed: u64,
    pub total: u64,
}

/// Must be non-blocking and must not perform remote I/O; a slow observer
/// cannot be allowed to stall the import.
pub type ProgressFn = dyn Fn(TableProgress) + Send + Sync;

/// Fatal pre-flight and infrastructure failures that abort the run before
/// (or outside) per-record processing. Per-record failures never surface
/// here; they are logged and counted instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read staging table {table}: {source}")]
    Staging {
        table: TableKind,
        #[source]
        source: sqlx::Error,
    },
    #[error("destination schema is missing table {table}")]
    MissingDestinationTable { table: TableKind },
    #[error("destination database error: {0}")]
    Destination(#[from] sqlx::Error),
    #[error("failed to prepare audit log: {0}")]
    AuditLog(#[source] anyhow::Error),
    #[error("failed to write summary report: {0}")]
    SummaryReport(#[source] anyhow::Error),
}

async fn ensure_destination_table(
    pool: &SqlitePool,
    table: TableKind,
) -> Result<(), ImportError> {
    let present: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .bind(table.as_str())
            .fetch_optional(pool)
            .await?;
    if present.is_none() {
        return Err(ImportError::MissingDestinationTable { table });
    }
    Ok(())
}

/// Run the full import: breed and customer, then animal, then notes.
///
/// Returns the cross-table summary after writing `IMPORT_SUMMARY.txt` to
/// the log directory. Re-running against a non-empty destination is not
/// idempotent; rows that already exist fail per record.
pub async fn run_import(
    staging_pool: &SqlitePool,
    dest_pool: &SqlitePool,
    options: &ImportOptions,
    on_progress: Option<&ProgressFn>,
) -> Result<ImportSummary, ImportError> {
    let started = Instant::now();
    let started_at = Utc::now();

    // Pre-flight: every staging table readable, every destination table
    // present, log directory writable. Any failure aborts before the first
    // record is touched.
    let mut expected: BTreeMap<TableKind, u64> = BTreeMap::new();
    for table in ALL_TABLES {
        let count = staging::count_records(staging_pool, table)
            .await
            .map_err(|source| ImportError::Staging { table, source })?;
        expected.insert(table, count);
    }
    for table in ALL_TABLES {
        ensure_destination_table(dest_pool, table).await?;
    }
    fs::create_dir_all(&options.log_dir)
        .map_err(|error| ImportError::AuditLog(anyhow::Error::new(error)))?;

    tracing::info!(
        target: "groomdb",
        event = "import_started",
        breeds = expected.get(&TableKind::Breed).copied().unwrap_or(0),
        customers = expected.get(&TableKind::Customer).copied().unwrap_or(0),
        animals = expected.get(&TableKind::Animal).copied().unwrap_or(0),
        notes = expected.get(&TableKind::Notes).copied().unwrap_or(0),
        log_dir = %options.log_dir.display()
    );

    let mut state = ImportState::new();
    let mut tables = BTreeMap::new();
    for table in dependency_order() {
        let stats =
            import_table(staging_pool, dest_pool, table, &mut state, options, on_progress).await?;
        debug_assert!(stats.is_consistent(), "stats invariant broken for {table}");
        tables.insert(table.as_str().to_string(), stats);
    }

    let finished_at = Utc::now();
    let summary = ImportSummary {
        started_at: started_at.to_rfc3339(),
        finished_at: finished_at.to_rfc3339(),
        duration_ms: started.elapsed().as_millis() as u64,
        tables,
        log_dir: options.log_dir.display().to_string(),
    };
    write_summary_report(&options.log_dir, &summary).map_err(ImportError::SummaryReport)?;

    let totals = summary.grand_totals();
    tracing::info!(
        target: "groomdb",
        event = "import_finished",
        duration_ms = summary.duration_ms,
        imported = totals.imported,
        repaired = totals.repaired,
        skipped = totals.skipped,
        failed = totals.failed,
        orphaned = totals.orphaned
    );
    Ok(summary)
}

async fn import_table(
    staging_pool: &SqlitePool,
    dest_pool: &SqlitePool,
    table: TableKind,
    state: &mut ImportState,
    options: &ImportOptions,
    on_progress: Option<&ProgressFn>,
) -> Result<ImportStats, ImportError> {
    let mut logger = TableLogger::create(&options.log_dir, table).map_err(ImportError::AuditLog)?;

    let records = staging::fetch_all(staging_pool, table)
        .await
        .map_err(|source| ImportError::Staging { table, source })?;

    let mut stats = ImportStats {
        total: records.len() as u64,
        ..ImportStats::default()
    };
    logger.info(&format!("Found {} {table} records", stats.total));

    let cadence = options.progress_every.max(1);
    let mut processed: u64 = 0;

    for raw in records {
        let original_id = raw.original_id();
        match validate_record(&raw, state, &options.orphan_fallbacks) {
            Validated::Skip { reason, orphaned } => {
                stats.skipped += 1;
                if orphaned {
                    stats.orphaned += 1;
                }
                logger.skipped(original_id, &raw, &reason);
            }
            Validated::Accept { record, repairs } => {
                match insert_record(dest_pool, &record).await {
                    Ok(()) => {
                        state.note_accepted(&record);
                        let destination_id = record.id();
                        if repairs.is_empty() {
                            stats.imported += 1;
                            logger.imported(original_id, destination_id);
                        } else {
                            stats.repaired += 1;
                            logger.repaired(original_id, destination_id, &raw, &record, &repairs);
                        }
                    }
                    Err(error) => {
                        stats.failed += 1;
                        logger.failed(original_id, &raw, &error.to_string());
                        tracing::warn!(
                            target: "groomdb",
                            event = "record_insert_failed",
                            table = %table,
                            id = original_id,
                            error = %error
                        );
                    }
                }
            }
        }

        processed += 1;
        if processed % cadence == 0 {
            if let Some(callback) = on_progress {
                callback(TableProgress {
                    table,
                    processed,
                    total: stats.total,
                });
            }
        }
    }

    if let Some(callback) = on_progress {
        callback(TableProgress {
            table,
            processed: stats.total,
            total: stats.total,
        });
    }

    logger.finish(&stats);
    tracing::info!(
        target: "groomdb",
        event = "table_complete",
        table = %table,
        total = stats.total,
        imported = stats.imported,
        repaired = stats.repaired,
        skipped = stats.skipped,
        failed = stats.failed,
        orphaned = stats.orphaned
    );
    Ok(stats)
}
