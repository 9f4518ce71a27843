use crate::error::Result;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// List the files to archive under `path`.
///
/// A regular file yields itself. A directory is walked recursively and its
/// regular files are returned in sorted order. Symlinks to files are kept and
/// archived with the target's contents; symlinked directories are not
/// descended into.
pub fn collect_input_files(path: &Path) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let file_type = entry.file_type();
        if file_type.is_file() {
            files.push(entry.into_path());
        } else if file_type.is_symlink() {
            match std::fs::metadata(entry.path()) {
                Ok(target) if target.is_file() => files.push(entry.into_path()),
                Ok(_) => {
                    tracing::warn!(path = %entry.path().display(), "skipping symlink to non-file");
                }
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "skipping broken symlink");
                }
            }
        } else if !file_type.is_dir() {
            tracing::warn!(path = %entry.path().display(), "skipping special file");
        }
    }
    Ok(files)
}

/// Name a file is stored under, relative to the archive root.
///
/// For `.`, `..` and similar roots the root is stripped entirely. Any other
/// root keeps its last component, so archiving `data/docs` stores
/// `data/docs/a.txt` as `docs/a.txt`. Separators are always `/`.
pub fn archive_name(root: &Path, file: &Path) -> String {
    let dot_root = root
        .components()
        .all(|c| matches!(c, Component::CurDir | Component::ParentDir));

    let base = if dot_root {
        Some(root)
    } else {
        root.parent()
    };

    let relative = base
        .and_then(|b| file.strip_prefix(b).ok())
        .unwrap_or(file);

    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
