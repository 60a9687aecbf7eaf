//! Audit trail for an import run.
//!
//! One append-as-you-go log file per table, flushed after every record so a
//! crash mid-run leaves a valid, merely truncated, log. After all tables
//! finish, a cross-table `IMPORT_SUMMARY.txt` is written — the first
//! artifact an operator should read.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::rows::{NormalizedRecord, RawRecord};
use super::table_order::{dependency_order, TableKind};
use super::validate::RecordStatus;

const RULE: &str = "================================================================================";

/// Per-table outcome counters. `orphaned` is a disjoint subset of `skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub total: u64,
    pub imported: u64,
    pub repaired: u64,
    pub skipped: u64,
    pub failed: u64,
    pub orphaned: u64,
}

impl ImportStats {
    pub fn accepted(&self) -> u64 {
        self.imported + self.repaired
    }

    pub fn processed(&self) -> u64 {
        self.imported + self.repaired + self.skipped + self.failed
    }

    /// `imported + repaired + skipped + failed == total`, orphans within skips.
    pub fn is_consistent(&self) -> bool {
        self.processed() == self.total && self.orphaned <= self.skipped
    }
}

/// Final cross-table result handed back to the caller (and rendered into
/// the summary report).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub started_at: String,
    pub finished_at: String,
    pub duration_ms: u64,
    pub tables: BTreeMap<String, ImportStats>,
    pub log_dir: String,
}

impl ImportSummary {
    pub fn stats(&self, table: TableKind) -> ImportStats {
        self.tables.get(table.as_str()).copied().unwrap_or_default()
    }

    pub fn grand_totals(&self) -> ImportStats {
        let mut totals = ImportStats::default();
        for stats in self.tables.values() {
            totals.total += stats.total;
            totals.imported += stats.imported;
            totals.repaired += stats.repaired;
            totals.skipped += stats.skipped;
            totals.failed += stats.failed;
            totals.orphaned += stats.orphaned;
        }
        totals
    }
}

/// Append-only audit log for one table.
pub struct TableLogger {
    file: File,
    path: PathBuf,
    table: TableKind,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl TableLogger {
    /// Open the log file at table start so partial progress survives a crash.
    pub fn create(log_dir: &Path, table: TableKind) -> Result<Self> {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("create log directory {}", log_dir.display()))?;

        let started_at = Utc::now();
        let ts = started_at.format("%Y%m%d_%H%M%S");
        let mut path = log_dir.to_path_buf();
        let mut counter = 0;
        loop {
            let name = if counter == 0 {
                format!("{table}_import_{ts}.log")
            } else {
                format!("{table}_import_{ts}_{counter}.log")
            };
            path.push(&name);
            if !path.exists() {
                break;
            }
            path.pop();
            counter += 1;
        }
        let file = File::create(&path)
            .with_context(|| format!("create import log {}", path.display()))?;

        let mut logger = Self {
            file,
            path,
            table,
            started_at,
            started: Instant::now(),
        };
        logger.write_line(RULE);
        logger.write_line(&format!(
            "IMPORT LOG: {}",
            table.as_str().to_uppercase()
        ));
        logger.write_line(&format!("Started: {}", started_at.to_rfc3339()));
        logger.write_line(RULE);
        logger.write_line("");
        Ok(logger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Best-effort once the run is underway: a failed log write must not
    // abort record processing.
    fn write_line(&mut self, line: &str) {
        let _ = writeln!(self.file, "{line}");
        let _ = self.file.flush();
    }

    pub fn info(&mut self, message: &str) {
        self.write_line(&format!("[INFO] {message}"));
    }

    pub fn imported(&mut self, original_id: i64, destination_id: i64) {
        self.write_line(&format!(
            "[{}] ID: {original_id} -> {destination_id}",
            RecordStatus::Imported.tag()
        ));
    }

    pub fn repaired(
        &mut self,
        original_id: i64,
        destination_id: i64,
        raw: &RawRecord,
        record: &NormalizedRecord,
        repairs: &[String],
    ) {
        self.write_line("");
        self.write_line(&format!(
            "[{}] ID: {original_id} -> {destination_id}",
            RecordStatus::Repaired.tag()
        ));
        self.write_line("  Original data:");
        self.write_line(&format!("    {}", raw.to_json()));
        self.write_line("  Imported as:");
        self.write_line(&format!("    {}", record.to_json()));
        self.write_line("  Repairs applied:");
        for repair in repairs {
            self.write_line(&format!("    - {repair}"));
        }
    }

    pub fn skipped(&mut self, original_id: i64, raw: &RawRecord, reason: &str) {
        self.write_line("");
        self.write_line(&format!(
            "[{}] ID: {original_id}",
            RecordStatus::Skipped.tag()
        ));
        self.write_line("  Original data:");
        self.write_line(&format!("    {}", raw.to_json()));
        self.write_line(&format!("  Reason: {reason}"));
    }

    pub fn failed(&mut self, original_id: i64, raw: &RawRecord, error: &str) {
        self.write_line("");
        self.write_line(&format!(
            "[{}] ID: {original_id}",
            RecordStatus::Failed.tag()
        ));
        self.write_line("  Original data:");
        self.write_line(&format!("    {}", raw.to_json()));
        self.write_line(&format!("  Error: {error}"));
    }

    /// Append the aggregate block and close the file.
    pub fn finish(mut self, stats: &ImportStats) -> PathBuf {
        let elapsed = self.started.elapsed();
        self.write_line("");
        self.write_line(RULE);
        self.write_line("SUMMARY");
        self.write_line(RULE);
        self.write_line(&format!("Total records processed: {}", stats.total));
        self.write_line(&format!("  Imported (clean):     {}", stats.imported));
        self.write_line(&format!("  Imported (repaired):  {}", stats.repaired));
        self.write_line(&format!("  Skipped:              {}", stats.skipped));
        self.write_line(&format!("    of which orphaned:  {}", stats.orphaned));
        self.write_line(&format!("  Failed:               {}", stats.failed));
        self.write_line(&format!("Duration: {:.3}s", elapsed.as_secs_f64()));
        self.write_line(RULE);
        tracing::info!(
            target: "groomdb",
            event = "table_log_closed",
            table = %self.table,
            started_at = %self.started_at.to_rfc3339(),
            path = %self.path.display()
        );
        self.path
    }
}

fn section_title(table: TableKind) -> &'static str {
    match table {
        TableKind::Breed => "BREEDS",
        TableKind::Customer => "CUSTOMERS",
        TableKind::Animal => "ANIMALS",
        TableKind::Notes => "NOTES",
    }
}

/// Write the cross-table summary report. Non-zero skip/fail/orphan counts
/// must be impossible to miss.
pub fn write_summary_report(log_dir: &Path, summary: &ImportSummary) -> Result<PathBuf> {
    let path = log_dir.join("IMPORT_SUMMARY.txt");
    let mut lines: Vec<String> = vec![
        RULE.to_string(),
        "DATABASE IMPORT SUMMARY REPORT".to_string(),
        RULE.to_string(),
        String::new(),
        format!("Import started:  {}", summary.started_at),
        format!("Import finished: {}", summary.finished_at),
        format!("Duration:        {:.3}s", summary.duration_ms as f64 / 1000.0),
        String::new(),
        RULE.to_string(),
        String::new(),
    ];

    for table in dependency_order() {
        let stats = summary.stats(table);
        lines.push(format!("{}:", section_title(table)));
        lines.push(format!("  Total in backup:       {}", stats.total));
        lines.push(format!("  Successfully imported: {}", stats.accepted()));
        if stats.repaired > 0 {
            lines.push(format!("    - Clean imports:     {}", stats.imported));
            lines.push(format!("    - Repaired:          {}", stats.repaired));
        }
        if stats.orphaned > 0 {
            lines.push(format!("  Orphaned (skipped):    {}", stats.orphaned));
        }
        if stats.skipped > stats.orphaned {
            lines.push(format!(
                "  Other skipped:         {}",
                stats.skipped - stats.orphaned
            ));
        }
        if stats.failed > 0 {
            lines.push(format!("  Failed:                {}", stats.failed));
        }
        lines.push(String::new());
    }

    let totals = summary.grand_totals();
    lines.push(RULE.to_string());
    lines.push(String::new());
    lines.push("TOTALS:".to_string());
    lines.push(format!("  Records imported:    {}", totals.accepted()));
    lines.push(format!("  Records repaired:    {}", totals.repaired));
    lines.push(format!("  Orphaned records:    {}", totals.orphaned));
    if totals.skipped > totals.orphaned {
        lines.push(format!(
            "  Other skipped:       {}",
            totals.skipped - totals.orphaned
        ));
    }
    if totals.failed > 0 {
        lines.push(format!("  Failed records:      {}", totals.failed));
    }
    lines.push(String::new());

    if totals.orphaned > 0 {
        lines.push(RULE.to_string());
        lines.push(String::new());
        lines.push("NOTE: Orphaned records are those with missing parent references:".to_string());
        lines.push("  - Animals without a valid customerID (customer was deleted)".to_string());
        lines.push("  - Notes without a valid animalID (animal was deleted)".to_string());
        lines.push(String::new());
        lines.push("These records were skipped to maintain database integrity.".to_string());
        lines.push("Check individual table logs for specific record details.".to_string());
        lines.push(String::new());
    }

    lines.push(RULE.to_string());
    lines.push(format!("Full import logs available in: {}", summary.log_dir));
    lines.push(RULE.to_string());

    fs::write(&path, lines.join("\n"))
        .with_context(|| format!("write summary report {}", path.display()))?;
    Ok(path)
}

/// Timestamped run directory under an operator-supplied base.
pub fn run_log_dir(base: &Path) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    base.join(timestamp.to_string())
}

/// Best-effort retention: keep the newest `keep` run directories under
/// `base`, removing older ones.
pub fn prune_run_dirs(base: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(base) else {
        return;
    };
    let mut dirs: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                let meta = entry.metadata().ok()?;
                let created = meta.created().or_else(|_| meta.modified()).ok()?;
                Some((created, path))
            } else {
                None
            }
        })
        .collect();
    dirs.sort_by_key(|(created, _)| *created);
    let len = dirs.len();
    if len > keep {
        for (_, path) in dirs.into_iter().take(len - keep) {
            if let Err(error) = fs::remove_dir_all(&path) {
                tracing::warn!(
                    target: "groomdb",
                    event = "log_prune_failed",
                    path = %path.display(),
                    error = %error
                );
            }
        }
    }
}
