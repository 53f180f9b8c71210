//! Hash helpers shared by the key policies and the interned table.

/// Mixes two 32-bit hashes into one.
///
/// Used to hash compound keys (pairs, triples) from the hashes of their parts.
#[inline]
pub fn combine(lhs: u32, rhs: u32) -> u32 {
    let mut key = ((lhs as u64) << 32) | rhs as u64;
    key = key.wrapping_add(!(key << 32));
    key ^= key >> 22;
    key = key.wrapping_add(!(key << 13));
    key ^= key >> 8;
    key = key.wrapping_add(key << 3);
    key ^= key >> 15;
    key = key.wrapping_add(!(key << 27));
    key ^= key >> 31;
    key as u32
}

/// Bernstein hash (`h * 33 + b`) over raw bytes.
///
/// Every byte participates, including embedded NULs, so keys that differ
/// only past a NUL still hash apart.
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |h, &b| h.wrapping_mul(33).wrapping_add(b as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_bytes_matches_reference_values() {
        assert_eq!(hash_bytes(b""), 0);
        assert_eq!(hash_bytes(b"a"), 97);
        assert_eq!(hash_bytes(b"ab"), 97 * 33 + 98);
    }

    /// Invariant: bytes after an embedded NUL still affect the hash.
    #[test]
    fn hash_bytes_sees_past_nul() {
        assert_ne!(hash_bytes(b"a\0b"), hash_bytes(b"a\0c"));
        assert_ne!(hash_bytes(b"a"), hash_bytes(b"a\0"));
    }

    #[test]
    fn combine_is_order_sensitive() {
        assert_ne!(combine(1, 2), combine(2, 1));
        assert_eq!(combine(7, 9), combine(7, 9));
    }
}
