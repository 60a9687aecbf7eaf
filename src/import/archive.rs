//! Compress a run's log directory into a single ZIP for download/retention.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Clone)]
pub struct ArchiveResult {
    pub zip_path: PathBuf,
    pub file_count: usize,
    pub total_bytes: u64,
}

/// Zip every file directly inside `log_dir` into
/// `import-logs-<dirname>.zip` next to the directory.
pub fn archive_logs(log_dir: &Path) -> Result<ArchiveResult> {
    if !log_dir.is_dir() {
        bail!("log directory {} does not exist", log_dir.display());
    }
    let dir_name = log_dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("run");
    let zip_path = log_dir
        .parent()
        .unwrap_or(Path::new("."))
        .join(format!("import-logs-{dir_name}.zip"));

    let mut files: Vec<PathBuf> = fs::read_dir(log_dir)
        .with_context(|| format!("read log directory {}", log_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    if files.is_empty() {
        bail!("no log files found to archive in {}", log_dir.display());
    }

    let output = File::create(&zip_path)
        .with_context(|| format!("create archive {}", zip_path.display()))?;
    let mut writer = ZipWriter::new(output);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut file_count = 0;
    for path in &files {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        writer
            .start_file(name, options)
            .with_context(|| format!("add {name} to archive"))?;
        let mut input =
            File::open(path).with_context(|| format!("open log file {}", path.display()))?;
        io::copy(&mut input, &mut writer)
            .with_context(|| format!("compress log file {}", path.display()))?;
        file_count += 1;
    }
    writer.finish().context("finalize log archive")?;

    let total_bytes = fs::metadata(&zip_path).map(|meta| meta.len()).unwrap_or(0);
    Ok(ArchiveResult {
        zip_path,
        file_count,
        total_bytes,
    })
}

/// Cheap sanity check: the archive exists and is non-empty.
pub fn verify_archive(zip_path: &Path) -> bool {
    fs::metadata(zip_path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}
