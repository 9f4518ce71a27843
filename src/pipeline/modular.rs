//! Small-integer modular arithmetic backing the byte cipher.

/// Compute `base^exponent mod modulus` by square-and-multiply.
///
/// Intermediate products are widened to `u128`, so any `u64` modulus is safe.
/// A modulus of 1 yields 0 (every value is congruent to 0 mod 1); a modulus
/// of 0 has no ring to reduce into and is treated the same way.
pub fn power_modulus(base: u64, exponent: u64, modulus: u64) -> u64 {
    if modulus <= 1 {
        return 0;
    }

    let m = modulus as u128;
    let mut result: u128 = 1;
    let mut base = base as u128 % m;
    let mut exponent = exponent;

    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result * base % m;
        }
        base = base * base % m;
        exponent >>= 1;
    }

    result as u64
}

/// Find `d` in `[2, phi)` with `e * d ≡ 1 (mod phi)` by linear search.
///
/// This is deliberately the brute-force scan, so cost grows with `phi`;
/// only small key seeds are practical. Returns `None` when no inverse exists
/// in range.
pub fn modular_inverse(e: u64, phi: u64) -> Option<u64> {
    (2..phi).find(|&d| (e as u128 * d as u128) % phi as u128 == 1)
}

/// Greatest common divisor.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Trial-division primality test, adequate for 32-bit key seeds.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut i = 3u64;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_modulus_known_values() {
        assert_eq!(power_modulus(4, 13, 497), 445);
        assert_eq!(power_modulus(2, 10, 1000), 24);
        assert_eq!(power_modulus(65, 7, 3233), 1317);
        assert_eq!(power_modulus(1317, 1783, 3233), 65);
    }

    #[test]
    fn test_power_modulus_zero_exponent() {
        assert_eq!(power_modulus(123, 0, 97), 1);
        assert_eq!(power_modulus(0, 0, 97), 1);
    }

    #[test]
    fn test_power_modulus_degenerate_modulus() {
        assert_eq!(power_modulus(5, 3, 1), 0);
        assert_eq!(power_modulus(5, 0, 1), 0);
        assert_eq!(power_modulus(5, 3, 0), 0);
    }

    #[test]
    fn test_power_modulus_large_operands() {
        // (2^32 - 1)^2 overflows u64 without widening
        let m = u32::MAX as u64;
        let base = m - 1;
        assert_eq!(power_modulus(base, 2, m), 1);
    }

    #[test]
    fn test_modular_inverse() {
        assert_eq!(modular_inverse(7, 3120), Some(1783));
        assert_eq!(modular_inverse(3, 11), Some(4));
        // 4 and 8 share a factor, no inverse exists
        assert_eq!(modular_inverse(4, 8), None);
        assert_eq!(modular_inverse(1, 2), None);
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(3120, 7), 1);
        assert_eq!(gcd(3120, 2), 2);
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(5, 0), 5);
    }

    #[test]
    fn test_is_prime() {
        let primes = [2u64, 3, 5, 53, 61, 65_521];
        for p in primes {
            assert!(is_prime(p), "{} should be prime", p);
        }
        for n in [0u64, 1, 4, 9, 3233, 65_535] {
            assert!(!is_prime(n), "{} should not be prime", n);
        }
    }
}
