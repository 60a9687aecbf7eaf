/// Initialize the tracing subscriber for binaries and ad-hoc tooling.
///
/// Filter comes from `GROOMDB_LOG` (default `groomdb=info,sqlx=warn`),
/// output is JSON lines with UTC timestamps. Safe to call more than once;
/// later calls are no-ops.
pub fn init() {
    let _ = tracing_log::LogTracer::init();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("GROOMDB_LOG").unwrap_or_else(|_| "groomdb=info,sqlx=warn".into()),
        )
        .json()
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .try_init();
}
