use crate::archive::{read_archive_file, Archive};
use crate::error::Result;
use std::path::Path;

/// Entry names of `archive`, sorted
pub fn list_entries(archive: &Archive) -> Vec<String> {
    archive.names()
}

/// Render a listing of the archive at `path`
pub fn show_archive(path: &Path) -> Result<String> {
    let archive = read_archive_file(path)?;
    Ok(render_listing(path, &archive))
}

fn render_listing(path: &Path, archive: &Archive) -> String {
    let mut output = String::new();

    output.push_str(&format!("Files in {}:\n", path.display()));
    output.push_str(&format!("  Entries: {}\n", archive.entry_count()));
    output.push_str(&format!("  Modulus: {}\n", archive.keys.public.modulus));
    output.push('\n');

    let mut entries: Vec<_> = archive.entries.iter().collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    if entries.is_empty() {
        output.push_str("  No files found.\n");
    }
    for entry in entries {
        // Base64 carries 3 bytes per 4 characters
        let payload = entry.data.len() as u64 / 4 * 3;
        output.push_str(&format!(
            "  - {} ({}, {} codes)\n",
            entry.name,
            format_size(payload),
            entry.table.len()
        ));
    }

    output
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
