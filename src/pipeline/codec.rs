//! Text-safe encodings for binary payloads and key material.

use crate::error::{PerzipError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Width of one serialized integer in bytes
pub const INTEGER_WIDTH: usize = 4;

/// Standard Base64 with padding and no line breaks
pub fn to_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn from_base64(text: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(text.trim())?)
}

/// Serialize integers as fixed-width big-endian words
pub fn integers_to_bytes(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

/// Inverse of [`integers_to_bytes`]. The input length must be a multiple of
/// [`INTEGER_WIDTH`].
pub fn bytes_to_integers(data: &[u8]) -> Result<Vec<u32>> {
    if data.len() % INTEGER_WIDTH != 0 {
        return Err(PerzipError::Codec(format!(
            "integer stream length {} is not a multiple of {}",
            data.len(),
            INTEGER_WIDTH
        )));
    }
    Ok(data
        .chunks_exact(INTEGER_WIDTH)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

pub fn integers_to_text(values: &[u32]) -> String {
    to_base64(&integers_to_bytes(values))
}

pub fn text_to_integers(text: &str) -> Result<Vec<u32>> {
    bytes_to_integers(&from_base64(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base64_known_vector() {
        assert_eq!(to_base64(b"perzip"), "cGVyemlw");
        assert_eq!(from_base64("cGVyemlw").unwrap(), b"perzip");
        assert_eq!(to_base64(b""), "");
    }

    #[test]
    fn test_base64_has_no_line_breaks() {
        let data = vec![0xAB; 4096];
        assert!(!to_base64(&data).contains('\n'));
    }

    #[test]
    fn test_base64_rejects_garbage() {
        assert!(matches!(from_base64("not base64!!"), Err(PerzipError::Base64(_))));
    }

    #[test]
    fn test_integers_are_big_endian() {
        assert_eq!(integers_to_bytes(&[7, 3233]), vec![0, 0, 0, 7, 0, 0, 0x0c, 0xa1]);
    }

    #[test]
    fn test_integer_text_roundtrip() {
        let text = integers_to_text(&[1783, 3233]);
        assert_eq!(text_to_integers(&text).unwrap(), vec![1783, 3233]);
    }

    #[test]
    fn test_integer_stream_must_be_aligned() {
        let text = to_base64(&[0, 0, 1]);
        assert!(matches!(text_to_integers(&text), Err(PerzipError::Codec(_))));
    }

    proptest! {
        #[test]
        fn prop_base64_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(from_base64(&to_base64(&data)).unwrap(), data);
        }

        #[test]
        fn prop_integer_text_roundtrip(values in proptest::collection::vec(any::<u32>(), 0..32)) {
            prop_assert_eq!(text_to_integers(&integers_to_text(&values)).unwrap(), values);
        }
    }
}
