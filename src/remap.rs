//! Extraction patterns: which entries to extract and where they land.
//!
//! A pattern is a regular expression searched anywhere in the entry name.
//! Output paths are resolved under the output root as follows:
//!
//! - empty pattern: the full entry name (`dir/a.txt` → `<out>/dir/a.txt`)
//! - pattern ending in `/*`: the matched part is removed, flattening the
//!   archived prefix (`dir/*` on `dir/a.txt` → `<out>/a.txt`)
//! - pattern containing `/`: only its directory portion is removed, keeping
//!   the structure below it (`dir/sub/a.*` on `dir/sub/a.txt` → `<out>/a.txt`)
//! - any other pattern: the full entry name

use crate::error::Result;
use regex::Regex;
use std::path::{Component, Path, PathBuf};

/// Suffix that selects strip-prefix (flattening) extraction
pub const FLATTEN_MARKER: &str = "/*";

#[derive(Debug, Clone)]
pub struct ExtractPattern {
    source: String,
    matcher: Regex,
    strip: Option<Regex>,
}

impl ExtractPattern {
    /// Normalize and compile `pattern`.
    ///
    /// Without the flatten marker, the directory portion is the pattern text
    /// before its last `/`. When that text does not compile on its own (as in
    /// `(a/b)`), nothing is stripped. Only the full pattern must be valid.
    pub fn parse(pattern: &str) -> Result<Self> {
        let (core, flatten) = match pattern.strip_suffix(FLATTEN_MARKER) {
            Some(rest) => (rest, true),
            None => (pattern, false),
        };
        let core = core.strip_prefix("./").unwrap_or(core);
        let core = core.strip_suffix('/').unwrap_or(core);
        let core = if core == "." { "" } else { core };

        let matcher = Regex::new(core)?;
        let strip = if core.is_empty() {
            None
        } else if flatten {
            Some(matcher.clone())
        } else {
            // Textual split: a cut through a group or class is not a regex
            core.rfind('/').and_then(|idx| match Regex::new(&core[..idx]) {
                Ok(prefix) => Some(prefix),
                Err(_) => {
                    tracing::debug!(pattern = core, "directory part is not a regex; keeping full names");
                    None
                }
            })
        };

        Ok(Self {
            source: core.to_string(),
            matcher,
            strip,
        })
    }

    /// Pattern text after normalization
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match_all(&self) -> bool {
        self.source.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }

    /// Archive-relative path the entry is written to, or `None` if the name
    /// would escape the output root.
    pub fn relative_path(&self, name: &str) -> Option<PathBuf> {
        if !is_safe_name(name) {
            return None;
        }

        let remapped = match &self.strip {
            Some(re) => re.replace(name, "").into_owned(),
            None => name.to_string(),
        };

        let mut path: PathBuf = remapped
            .split('/')
            .filter(|part| !part.is_empty() && *part != ".")
            .collect();

        // Pattern swallowed the whole name; fall back to its last component
        if path.as_os_str().is_empty() {
            path = PathBuf::from(name.rsplit('/').find(|p| !p.is_empty())?);
        }

        if path.components().all(|c| matches!(c, Component::Normal(_))) {
            Some(path)
        } else {
            None
        }
    }

    pub fn output_path(&self, root: &Path, name: &str) -> Option<PathBuf> {
        self.relative_path(name).map(|rel| root.join(rel))
    }
}

/// Entry names must be relative and free of `..` components
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('/')
        && !name.contains('\\')
        && name.split('/').all(|part| part != "..")
        && !Path::new(name).has_root()
}
