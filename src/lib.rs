pub mod db;
pub mod import;
pub mod logging;

pub use import::{
    archive_logs, dependency_order, prune_run_dirs, run_import, run_log_dir, verify_archive,
    ImportError, ImportOptions, ImportStats, ImportSummary, OrphanFallbacks, TableKind,
    TableProgress,
};
