pub mod archive;
pub mod identity;
pub mod logger;
pub mod normalize;
pub mod orchestrator;
mod insert;
mod rows;
mod staging;
mod table_order;
pub mod validate;

pub use archive::{archive_logs, verify_archive, ArchiveResult};
pub use identity::{AcceptedIds, IdentityMap, OrphanFallbacks, ParentRef};
pub use logger::{
    prune_run_dirs, run_log_dir, write_summary_report, ImportStats, ImportSummary, TableLogger,
};
pub use orchestrator::{
    run_import, ImportError, ImportOptions, ProgressFn, TableProgress, DEFAULT_PROGRESS_EVERY,
};
pub use rows::{
    AnimalRecord, BreedRecord, CustomerRecord, NormalizedRecord, NoteRecord, RawRecord, Sex,
};
pub use table_order::{dependency_order, TableKind, ALL_TABLES};
pub use validate::{validate_record, ImportState, RecordStatus, Validated};
