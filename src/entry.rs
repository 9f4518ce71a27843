use crate::archive::ArchiveEntry;
use crate::error::{PerzipError, Result};
use crate::pipeline::{
    compress_bytes, decompress_bytes, decrypt_bytes, encrypt_bytes, from_base64, to_base64,
    BitString, Decrypted, Key,
};
use sha2::{Digest, Sha256};

/// Hex SHA-256 digest stored alongside each entry
pub fn plaintext_digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Run one file through the archive pipeline:
/// Encrypt → Huffman compress → Pack bits → Base64
pub fn seal_entry(name: &str, data: &[u8], public: &Key) -> Result<ArchiveEntry> {
    if data.is_empty() {
        return Err(PerzipError::EmptyInput);
    }

    let encrypted = encrypt_bytes(data, public)?;
    let compressed = compress_bytes(&encrypted)?;
    if compressed.bits.is_empty() {
        return Err(PerzipError::Codec("compression produced no output".into()));
    }

    Ok(ArchiveEntry {
        name: name.to_string(),
        data: to_base64(&compressed.bits.to_bytes()),
        table: compressed.table,
        sha256: Some(plaintext_digest(data)),
    })
}

/// Reverse of [`seal_entry`]: Base64 → Unpack bits → Huffman decode → Decrypt.
///
/// When the entry carries a digest the recovered bytes must match it. Without
/// one, a lossy decrypt is reported through [`Decrypted::truncated`] only.
pub fn open_entry(entry: &ArchiveEntry, private: &Key) -> Result<Decrypted> {
    let packed = from_base64(&entry.data)?;
    let bits = BitString::from_bytes(&packed)?;
    let encrypted = decompress_bytes(&bits, &entry.table)?;
    if encrypted.is_empty() {
        return Err(PerzipError::Codec(format!(
            "entry {} decompressed to nothing",
            entry.name
        )));
    }

    let decrypted = decrypt_bytes(&encrypted, private)?;

    if let Some(expected) = &entry.sha256 {
        let actual = plaintext_digest(&decrypted.data);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(PerzipError::IntegrityError(format!(
                "digest mismatch for {}: expected {}, got {}",
                entry.name, expected, actual
            )));
        }
    }

    Ok(decrypted)
}
