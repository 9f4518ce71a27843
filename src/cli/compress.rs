use crate::archive::{write_archive_file, Archive, ArchiveEntry};
use crate::cli::run_with_threads;
use crate::entry::seal_entry;
use crate::error::{PerzipError, Result};
use crate::pipeline::{check_modulus, generate_keys, Key};
use crate::scan::{archive_name, collect_input_files};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Options for the compress command
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// First prime key seed
    pub p: u32,
    /// Second prime key seed
    pub q: u32,
    /// Worker threads; `None` uses every available core
    pub threads: Option<usize>,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            p: 61,
            q: 53,
            threads: None,
        }
    }
}

/// Build an archive from `files`, naming each entry relative to `root`.
///
/// One keypair covers the whole archive. Files that cannot be read or
/// transformed are logged and left out; key problems abort immediately.
/// Entries keep the order of `files` regardless of worker scheduling.
pub fn assemble_archive(root: &Path, files: &[PathBuf], options: &CompressOptions) -> Result<Archive> {
    let keys = generate_keys(options.p, options.q)?;
    check_modulus(&keys.public)?;

    tracing::info!(
        files = files.len(),
        modulus = keys.public.modulus,
        "assembling archive"
    );

    let sealed: Vec<Option<ArchiveEntry>> = run_with_threads(options.threads, || {
        files
            .par_iter()
            .map(|path| {
                let name = archive_name(root, path);
                match read_and_seal(path, &name, &keys.public) {
                    Ok(entry) => {
                        tracing::info!(file = %path.display(), name = %entry.name, "processed");
                        Ok(Some(entry))
                    }
                    Err(e) if e.is_recoverable() => {
                        tracing::warn!(file = %path.display(), error = %e, "skipping file");
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            })
            .collect()
    })?;

    let mut archive = Archive::new(keys);
    archive.entries = sealed.into_iter().flatten().collect();
    Ok(archive)
}

fn read_and_seal(path: &Path, name: &str, public: &Key) -> Result<ArchiveEntry> {
    let data = std::fs::read(path)?;
    seal_entry(name, &data, public)
}

/// Archive everything under `input` into the file at `output`.
/// Returns the number of entries written.
pub fn compress_to_file(input: &Path, output: &Path, options: &CompressOptions) -> Result<usize> {
    let files = collect_input_files(input)?;
    if files.is_empty() {
        return Err(PerzipError::EmptyInput);
    }

    let archive = assemble_archive(input, &files, options)?;
    if archive.entries.is_empty() {
        return Err(PerzipError::InvalidFormat(
            "no input file could be archived".into(),
        ));
    }

    write_archive_file(output, &archive)?;
    tracing::info!(
        output = %output.display(),
        entries = archive.entry_count(),
        skipped = files.len() - archive.entry_count(),
        "archive written"
    );
    Ok(archive.entry_count())
}
