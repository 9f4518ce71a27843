use crate::error::{PerzipError, Result};
use crate::pipeline::codec::{integers_to_text, text_to_integers};
use crate::pipeline::modular::{gcd, is_prime, modular_inverse};

/// One half of a keypair: an exponent and the shared modulus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub exponent: u32,
    pub modulus: u32,
}

impl Key {
    pub fn new(exponent: u32, modulus: u32) -> Self {
        Self { exponent, modulus }
    }

    /// Encode as Base64 of two big-endian 32-bit words: exponent, modulus
    pub fn to_text(&self) -> String {
        integers_to_text(&[self.exponent, self.modulus])
    }

    /// Decode key text produced by [`Key::to_text`]
    pub fn from_text(text: &str) -> Result<Self> {
        let values = text_to_integers(text)?;
        match values.as_slice() {
            [exponent, modulus] if *modulus > 0 => Ok(Self::new(*exponent, *modulus)),
            [_, _] => Err(PerzipError::Codec("key modulus is zero".into())),
            other => Err(PerzipError::Codec(format!(
                "key must hold 2 integers, found {}",
                other.len()
            ))),
        }
    }
}

/// Public `(e, n)` and private `(d, n)` halves sharing one modulus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPair {
    pub public: Key,
    pub private: Key,
}

/// Derive a keypair from two prime seeds.
///
/// `e` is the smallest integer >= 2 coprime to `φ = (p-1)(q-1)` and `d` its
/// inverse found by linear search. Seeds must be distinct primes whose product
/// fits the 32-bit key encoding.
pub fn generate_keys(p: u32, q: u32) -> Result<KeyPair> {
    for seed in [p, q] {
        if !is_prime(seed as u64) {
            return Err(PerzipError::Configuration(format!(
                "key seed {} is not prime",
                seed
            )));
        }
    }
    if p == q {
        return Err(PerzipError::Configuration(format!(
            "key seeds must differ (both are {})",
            p
        )));
    }

    let n = p.checked_mul(q).ok_or_else(|| {
        PerzipError::Configuration(format!(
            "modulus {} * {} does not fit in 32 bits",
            p, q
        ))
    })?;
    let phi = (p as u64 - 1) * (q as u64 - 1);

    let e = (2..phi).find(|&e| gcd(e, phi) == 1).ok_or_else(|| {
        PerzipError::Configuration(format!(
            "no public exponent coprime to phi={} for seeds {} and {}",
            phi, p, q
        ))
    })?;

    let d = modular_inverse(e, phi).ok_or_else(|| {
        PerzipError::Configuration(format!("public exponent {} has no inverse mod {}", e, phi))
    })?;

    tracing::debug!(n, phi, e, "generated keypair");

    Ok(KeyPair {
        public: Key::new(e as u32, n),
        private: Key::new(d as u32, n),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textbook_seeds() {
        let keys = generate_keys(61, 53).unwrap();
        assert_eq!(keys.public, Key::new(7, 3233));
        assert_eq!(keys.private, Key::new(1783, 3233));
    }

    #[test]
    fn test_key_invariant_holds() {
        for (p, q) in [(61, 53), (17, 19), (101, 103), (251, 257)] {
            let keys = generate_keys(p, q).unwrap();
            let phi = (p as u64 - 1) * (q as u64 - 1);
            let e = keys.public.exponent as u64;
            let d = keys.private.exponent as u64;
            assert!(e > 1 && e < phi);
            assert_eq!(gcd(e, phi), 1);
            assert_eq!(e * d % phi, 1);
            assert_eq!(keys.public.modulus, p * q);
            assert_eq!(keys.private.modulus, p * q);
        }
    }

    #[test]
    fn test_degenerate_seeds_rejected() {
        assert!(matches!(generate_keys(2, 3), Err(PerzipError::Configuration(_))));
        assert!(matches!(generate_keys(61, 61), Err(PerzipError::Configuration(_))));
        assert!(matches!(generate_keys(60, 53), Err(PerzipError::Configuration(_))));
        assert!(matches!(generate_keys(1, 53), Err(PerzipError::Configuration(_))));
    }

    #[test]
    fn test_oversized_modulus_rejected() {
        let err = generate_keys(65_537, 65_539).unwrap_err();
        assert!(matches!(err, PerzipError::Configuration(_)));
    }

    #[test]
    fn test_key_text_roundtrip() {
        let key = Key::new(1783, 3233);
        assert_eq!(Key::from_text(&key.to_text()).unwrap(), key);
    }

    #[test]
    fn test_key_text_wrong_arity() {
        let text = integers_to_text(&[1, 2, 3]);
        assert!(matches!(Key::from_text(&text), Err(PerzipError::Codec(_))));
        let zero = integers_to_text(&[7, 0]);
        assert!(matches!(Key::from_text(&zero), Err(PerzipError::Codec(_))));
    }
}
