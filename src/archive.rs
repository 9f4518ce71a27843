//! Archive document model and its JSON persistence.
//!
//! On disk a `.perzip` file is a single JSON document:
//!
//! ```text
//! {
//!     "public_key":  "<base64 (e, n)>",
//!     "private_key": "<base64 (d, n)>",
//!     "files": [
//!         { "file_name": "dir/a.txt",
//!           "file_data": "<base64 packed huffman bits>",
//!           "huffman_table": [ { "letter": 65, "code": "01" }, ... ],
//!           "sha256": "<hex digest of plaintext, optional>" }
//!     ]
//! }
//! ```

use crate::error::{PerzipError, Result};
use crate::pipeline::{CodeTable, Key, KeyPair};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Conventional archive file extension
pub const ARCHIVE_EXTENSION: &str = "perzip";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableRecord {
    letter: u8,
    code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryRecord {
    file_name: String,
    file_data: String,
    huffman_table: Vec<TableRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
}

#[derive(Debug, Serialize)]
struct DocumentRecord {
    public_key: String,
    private_key: String,
    files: Vec<EntryRecord>,
}

/// One archived file: encoded payload plus the table needed to decode it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Archive-relative path, `/`-separated
    pub name: String,
    /// Base64 of the packed Huffman bit stream
    pub data: String,
    pub table: CodeTable,
    /// Hex SHA-256 of the original plaintext
    pub sha256: Option<String>,
}

impl ArchiveEntry {
    fn to_record(&self) -> EntryRecord {
        EntryRecord {
            file_name: self.name.clone(),
            file_data: self.data.clone(),
            huffman_table: self
                .table
                .iter()
                .map(|(letter, code)| TableRecord {
                    letter,
                    code: code.to_string(),
                })
                .collect(),
            sha256: self.sha256.clone(),
        }
    }

    fn from_record(record: EntryRecord) -> Result<Self> {
        if record.huffman_table.is_empty() {
            return Err(PerzipError::InvalidFormat(format!(
                "entry {} has an empty huffman_table",
                record.file_name
            )));
        }
        let table = CodeTable::from_entries(
            record
                .huffman_table
                .into_iter()
                .map(|r| (r.letter, r.code)),
        )?;
        Ok(Self {
            name: record.file_name,
            data: record.file_data,
            table,
            sha256: record.sha256,
        })
    }
}

/// Keypair plus entries, in insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub keys: KeyPair,
    pub entries: Vec<ArchiveEntry>,
}

impl Archive {
    pub fn new(keys: KeyPair) -> Self {
        Self {
            keys,
            entries: Vec::new(),
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entry names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.name.clone()).collect();
        names.sort();
        names
    }

    /// Serialize to the JSON document, pretty-printed with 4-space indents
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let document = DocumentRecord {
            public_key: self.keys.public.to_text(),
            private_key: self.keys.private.to_text(),
            files: self.entries.iter().map(ArchiveEntry::to_record).collect(),
        };

        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        document.serialize(&mut serializer)?;
        Ok(out)
    }

    /// Parse and validate an archive document.
    ///
    /// Missing or undecodable keys, keys with differing moduli and a missing
    /// or empty `files` array are fatal. Individual malformed file entries are dropped with a warning.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(data)?;
        let object = value
            .as_object()
            .ok_or_else(|| PerzipError::InvalidFormat("document is not a JSON object".into()))?;

        let keys = KeyPair {
            public: read_key(object, "public_key")?,
            private: read_key(object, "private_key")?,
        };
        if keys.public.modulus != keys.private.modulus {
            return Err(PerzipError::InvalidFormat(format!(
                "public modulus {} does not match private modulus {}",
                keys.public.modulus, keys.private.modulus
            )));
        }

        let files = object
            .get("files")
            .and_then(Value::as_array)
            .ok_or_else(|| PerzipError::InvalidFormat("missing files array".into()))?;
        if files.is_empty() {
            return Err(PerzipError::InvalidFormat("files array is empty".into()));
        }

        let mut entries = Vec::with_capacity(files.len());
        for (index, raw) in files.iter().enumerate() {
            let parsed = serde_json::from_value::<EntryRecord>(raw.clone())
                .map_err(PerzipError::from)
                .and_then(ArchiveEntry::from_record);
            match parsed {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    let name = raw.get("file_name").and_then(Value::as_str).unwrap_or("?");
                    tracing::warn!(index, file = name, error = %e, "dropping malformed archive entry");
                }
            }
        }

        Ok(Self { keys, entries })
    }
}

fn read_key(object: &Map<String, Value>, field: &str) -> Result<Key> {
    let text = object
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| PerzipError::InvalidFormat(format!("missing {}", field)))?;
    Key::from_text(text).map_err(|e| PerzipError::InvalidFormat(format!("{}: {}", field, e)))
}

/// Read an archive from disk
pub fn read_archive_file(path: &Path) -> Result<Archive> {
    let data = std::fs::read(path)?;
    Archive::from_bytes(&data)
}

/// Write an archive to disk (creates new file or overwrites)
pub fn write_archive_file(path: &Path, archive: &Archive) -> Result<()> {
    let bytes = archive.to_bytes()?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::generate_keys;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_archive() -> Archive {
        let mut archive = Archive::new(generate_keys(61, 53).unwrap());
        archive.entries.push(ArchiveEntry {
            name: "dir/b.txt".into(),
            data: "CAE=".into(),
            table: CodeTable::from_entries(vec![(1, "0".into()), (2, "1".into())]).unwrap(),
            sha256: None,
        });
        archive.entries.push(ArchiveEntry {
            name: "a.txt".into(),
            data: "CAI=".into(),
            table: CodeTable::from_entries(vec![(9, "0".into())]).unwrap(),
            sha256: Some("00ff".into()),
        });
        archive
    }

    fn keys_json() -> (String, String) {
        let keys = generate_keys(61, 53).unwrap();
        (keys.public.to_text(), keys.private.to_text())
    }

    #[test]
    fn test_document_shape() {
        let bytes = sample_archive().to_bytes().unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert!(value["public_key"].is_string());
        assert!(value["private_key"].is_string());
        let files = value["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0]["file_name"], "dir/b.txt");
        assert_eq!(files[0]["huffman_table"][0]["letter"], 1);
        assert_eq!(files[0]["huffman_table"][0]["code"], "0");
        assert!(files[0].get("sha256").is_none());
        assert_eq!(files[1]["sha256"], "00ff");
    }

    #[test]
    fn test_document_uses_four_space_indent() {
        let text = String::from_utf8(sample_archive().to_bytes().unwrap()).unwrap();
        assert!(text.contains("\n    \"public_key\""));
    }

    #[test]
    fn test_bytes_roundtrip() {
        let archive = sample_archive();
        let parsed = Archive::from_bytes(&archive.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, archive);
        assert_eq!(parsed.names(), vec!["a.txt".to_string(), "dir/b.txt".to_string()]);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.perzip");
        let archive = sample_archive();
        write_archive_file(&path, &archive).unwrap();
        assert_eq!(read_archive_file(&path).unwrap(), archive);
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let (public, _) = keys_json();
        let doc = json!({ "public_key": public, "files": [] });
        let err = Archive::from_bytes(doc.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, PerzipError::InvalidFormat(_)));
    }

    #[test]
    fn test_undecodable_key_is_fatal() {
        let (public, _) = keys_json();
        let doc = json!({
            "public_key": public,
            "private_key": "AAAA",
            "files": [{ "file_name": "a", "file_data": "", "huffman_table": [{ "letter": 1, "code": "0" }] }]
        });
        let err = Archive::from_bytes(doc.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, PerzipError::InvalidFormat(_)));
    }

    #[test]
    fn test_mismatched_moduli_is_fatal() {
        let (public, _) = keys_json();
        let other = generate_keys(67, 71).unwrap();
        let doc = json!({
            "public_key": public,
            "private_key": other.private.to_text(),
            "files": [{ "file_name": "a", "file_data": "CAE=", "huffman_table": [{ "letter": 1, "code": "0" }] }]
        });
        let err = Archive::from_bytes(doc.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, PerzipError::InvalidFormat(_)));
    }

    #[test]
    fn test_empty_files_is_fatal() {
        let (public, private) = keys_json();
        let doc = json!({ "public_key": public, "private_key": private, "files": [] });
        assert!(Archive::from_bytes(doc.to_string().as_bytes()).is_err());

        let doc = json!({ "public_key": public, "private_key": private, "files": {} });
        assert!(Archive::from_bytes(doc.to_string().as_bytes()).is_err());
    }

    #[test]
    fn test_malformed_entries_are_dropped() {
        let (public, private) = keys_json();
        let doc = json!({
            "public_key": public,
            "private_key": private,
            "files": [
                { "file_name": "good", "file_data": "CAE=", "huffman_table": [{ "letter": 1, "code": "0" }] },
                { "file_name": "no-data", "huffman_table": [{ "letter": 1, "code": "0" }] },
                { "file_name": "empty-table", "file_data": "CAE=", "huffman_table": [] },
                { "file_name": "bad-letter", "file_data": "CAE=", "huffman_table": [{ "letter": 300, "code": "0" }] },
                { "file_name": "bad-code", "file_data": "CAE=", "huffman_table": [{ "letter": 1, "code": 5 }] },
                "not an object"
            ]
        });
        let archive = Archive::from_bytes(doc.to_string().as_bytes()).unwrap();
        assert_eq!(archive.names(), vec!["good".to_string()]);
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(Archive::from_bytes(b"{oops"), Err(PerzipError::Json(_))));
        assert!(matches!(Archive::from_bytes(b"[1, 2]"), Err(PerzipError::InvalidFormat(_))));
    }
}
