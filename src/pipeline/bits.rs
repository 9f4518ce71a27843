use crate::error::{PerzipError, Result};
use std::fmt;

/// Growable MSB-first bit sequence.
///
/// Serialized layout: `[valid_bits_in_last_byte: 1][packed bits...]`, where
/// the header is in `1..=8` (8 also covers the empty sequence).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitString {
    bytes: Vec<u8>,
    len: usize,
}

impl BitString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, bit: bool) {
        let offset = self.len % 8;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.len += 1;
    }

    /// Append a code written as a string of `'0'`/`'1'` characters
    pub fn push_code(&mut self, code: &str) -> Result<()> {
        for c in code.chars() {
            match c {
                '0' => self.push(false),
                '1' => self.push(true),
                other => {
                    return Err(PerzipError::Codec(format!(
                        "invalid bit character {:?} in code {:?}",
                        other, code
                    )))
                }
            }
        }
        Ok(())
    }

    /// Concatenate `other` after the bits already held
    pub fn append(&mut self, other: &BitString) {
        if self.len % 8 == 0 {
            self.bytes.extend_from_slice(&other.bytes);
            self.len += other.len;
        } else {
            for bit in other.iter() {
                self.push(bit);
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        Some(self.bytes[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.bytes[i / 8] & (0x80 >> (i % 8)) != 0)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let valid = match self.len % 8 {
            0 => 8,
            rem => rem as u8,
        };
        let mut out = Vec::with_capacity(1 + self.bytes.len());
        out.push(valid);
        out.extend_from_slice(&self.bytes);
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (&valid, packed) = data
            .split_first()
            .ok_or_else(|| PerzipError::Codec("packed bit stream is empty".into()))?;
        if !(1..=8).contains(&valid) {
            return Err(PerzipError::Codec(format!(
                "invalid valid-bits header {}",
                valid
            )));
        }
        if packed.is_empty() {
            if valid != 8 {
                return Err(PerzipError::Codec(
                    "valid-bits header present without payload".into(),
                ));
            }
            return Ok(Self::new());
        }

        let len = (packed.len() - 1) * 8 + valid as usize;
        let mut bytes = packed.to_vec();
        // Clear any padding bits so equality is well defined
        if valid < 8 {
            if let Some(last) = bytes.last_mut() {
                *last &= 0xFF << (8 - valid);
            }
        }
        Ok(Self { bytes, len })
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl std::str::FromStr for BitString {
    type Err = PerzipError;
    fn from_str(s: &str) -> Result<Self> {
        let mut bits = BitString::with_capacity(s.len());
        bits.push_code(s)?;
        Ok(bits)
    }
}
