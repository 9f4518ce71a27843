//! Byte-wise RSA-style transform.
//!
//! Every plaintext byte is raised to the public exponent independently and
//! stored as a 4-byte big-endian word, so ciphertext is exactly four times the
//! plaintext length. There is no padding; this is an obfuscation layer, not
//! secure encryption.

use crate::error::{PerzipError, Result};
use crate::pipeline::codec::INTEGER_WIDTH;
use crate::pipeline::keys::Key;
use crate::pipeline::modular::power_modulus;

/// Smallest modulus that keeps all 256 byte values distinct
pub const MIN_MODULUS: u32 = 256;

/// Output of [`decrypt_bytes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted {
    pub data: Vec<u8>,
    /// Number of decrypted values above 255 that were reduced modulo 256.
    /// Non-zero means the key does not match the ciphertext and `data` is lossy.
    pub truncated: usize,
}

impl Decrypted {
    pub fn is_lossy(&self) -> bool {
        self.truncated > 0
    }
}

/// Reject keys whose modulus cannot represent every byte value
pub fn check_modulus(key: &Key) -> Result<()> {
    if key.modulus < MIN_MODULUS {
        return Err(PerzipError::Configuration(format!(
            "modulus {} is too small to encrypt byte values (must be >= {})",
            key.modulus, MIN_MODULUS
        )));
    }
    Ok(())
}

pub fn encrypt_bytes(data: &[u8], public: &Key) -> Result<Vec<u8>> {
    check_modulus(public)?;

    let e = public.exponent as u64;
    let n = public.modulus as u64;
    let mut out = Vec::with_capacity(data.len() * INTEGER_WIDTH);

    for &byte in data {
        let value = power_modulus(byte as u64, e, n);
        if value >= n {
            return Err(PerzipError::Codec(format!(
                "encrypted value {} exceeds modulus {}",
                value, n
            )));
        }
        out.extend_from_slice(&(value as u32).to_be_bytes());
    }

    Ok(out)
}

pub fn decrypt_bytes(data: &[u8], private: &Key) -> Result<Decrypted> {
    if data.len() % INTEGER_WIDTH != 0 {
        return Err(PerzipError::Codec(format!(
            "ciphertext length {} is not a multiple of {}",
            data.len(),
            INTEGER_WIDTH
        )));
    }

    let d = private.exponent as u64;
    let n = private.modulus as u64;
    let mut out = Vec::with_capacity(data.len() / INTEGER_WIDTH);
    let mut truncated = 0usize;

    for word in data.chunks_exact(INTEGER_WIDTH) {
        let value = u32::from_be_bytes([word[0], word[1], word[2], word[3]]) as u64;
        let plain = power_modulus(value, d, n);
        if plain > u8::MAX as u64 {
            truncated += 1;
        }
        out.push((plain % 256) as u8);
    }

    if truncated > 0 {
        tracing::warn!(
            truncated,
            modulus = n,
            "decrypted values exceed byte range; output reduced modulo 256"
        );
    }

    Ok(Decrypted { data: out, truncated })
}
