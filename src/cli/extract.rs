use crate::archive::{read_archive_file, Archive, ArchiveEntry};
use crate::cli::run_with_threads;
use crate::entry::open_entry;
use crate::error::Result;
use crate::remap::ExtractPattern;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Options for the extract command
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Entry selection pattern; empty extracts everything
    pub pattern: String,
    /// Worker threads; `None` uses every available core
    pub threads: Option<usize>,
}

/// What an extraction did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Files written, in archive order
    pub written: Vec<PathBuf>,
    /// Names of matching entries that could not be restored
    pub skipped: Vec<String>,
    /// Entries that did not match the pattern
    pub unmatched: usize,
    /// Written files whose decryption had to reduce values modulo 256
    pub lossy: usize,
}

/// Restore the entries of `archive` matching `options.pattern` under `output_root`.
///
/// Entries are decoded in parallel and written sequentially in archive order.
/// A failure on one entry is logged and that entry skipped; only an invalid
/// pattern aborts the extraction.
pub fn extract_archive(
    archive: &Archive,
    output_root: &Path,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let pattern = ExtractPattern::parse(&options.pattern)?;
    let mut report = ExtractReport::default();

    let mut selected: Vec<(&ArchiveEntry, PathBuf)> = Vec::new();
    for entry in &archive.entries {
        if !pattern.matches(&entry.name) {
            tracing::debug!(name = %entry.name, pattern = pattern.as_str(), "skipped, does not match");
            report.unmatched += 1;
            continue;
        }
        match pattern.output_path(output_root, &entry.name) {
            Some(path) => selected.push((entry, path)),
            None => {
                tracing::warn!(name = %entry.name, "skipping entry with unsafe path");
                report.skipped.push(entry.name.clone());
            }
        }
    }

    let private = archive.keys.private;
    let decoded = run_with_threads(options.threads, || {
        Ok(selected
            .par_iter()
            .map(|(entry, _)| open_entry(entry, &private))
            .collect::<Vec<_>>())
    })?;

    for ((entry, path), result) in selected.iter().zip(decoded) {
        let restored = match result {
            Ok(restored) => restored,
            Err(e) => {
                tracing::warn!(name = %entry.name, error = %e, "failed to restore entry");
                report.skipped.push(entry.name.clone());
                continue;
            }
        };

        if restored.is_lossy() {
            tracing::warn!(
                name = %entry.name,
                truncated = restored.truncated,
                "entry restored lossily; private key does not match ciphertext"
            );
            report.lossy += 1;
        }

        if let Err(e) = write_output(path, &restored.data) {
            tracing::warn!(name = %entry.name, path = %path.display(), error = %e, "failed to write entry");
            report.skipped.push(entry.name.clone());
            continue;
        }

        tracing::info!(name = %entry.name, path = %path.display(), "extracted");
        report.written.push(path.clone());
    }

    Ok(report)
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            tracing::debug!(dir = %parent.display(), "creating directory");
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, data)?;
    Ok(())
}

/// Load the archive at `input` and extract it under `output_root`
pub fn extract_from_file(
    input: &Path,
    output_root: &Path,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let archive = read_archive_file(input)?;
    extract_archive(&archive, output_root, options)
}
