//! Perzip - encrypted, Huffman-compressed single-file archives
//!
//! A `.perzip` archive is one JSON document holding a keypair and one entry
//! per archived file. Each entry carries its own Huffman code table, so
//! entries decode independently and can be extracted selectively.
//!
//! ## Transform Pipeline
//!
//! Each file goes through the following transforms:
//!
//! ```text
//! Input → Encrypt → Huffman → Pack → Base64 → Entry
//! ```
//!
//! - **Encrypt**: byte-wise modular exponentiation, each byte becomes a 4-byte word
//! - **Huffman**: per-file code table built from the ciphertext histogram
//! - **Pack**: bit string packed MSB-first behind a valid-bits header byte
//! - **Base64**: makes the payload safe to embed in JSON
//!
//! Extraction runs the inverse chain for every entry whose name matches a
//! pattern and remaps the output path (see [`remap`]).
//!
//! The cipher is textbook RSA over small integers with no padding. It
//! obscures data; it does not protect it.
//!
//! ## Example
//!
//! ```no_run
//! use perzip::cli::{compress_to_file, extract_from_file, CompressOptions, ExtractOptions};
//! use std::path::Path;
//!
//! compress_to_file(
//!     Path::new("docs"),
//!     Path::new("docs.perzip"),
//!     &CompressOptions { p: 61, q: 53, threads: None },
//! ).unwrap();
//!
//! extract_from_file(
//!     Path::new("docs.perzip"),
//!     Path::new("restored"),
//!     &ExtractOptions { pattern: "docs/*".into(), ..Default::default() },
//! ).unwrap();
//! ```

pub mod archive;
pub mod cli;
pub mod entry;
pub mod error;
pub mod pipeline;
pub mod remap;
pub mod scan;

pub use archive::{read_archive_file, write_archive_file, Archive, ArchiveEntry};
pub use error::{PerzipError, Result};
pub use pipeline::{generate_keys, CodeTable, Key, KeyPair};
