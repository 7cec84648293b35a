use crate::constants::hash::{FNV1A64_OFFSET, FNV1A64_PRIME, PART_SEPARATOR};

/// FNV-1a over raw bytes. Unlike `DefaultHasher`, the output is fixed across
/// toolchains and platforms, which persisted seeds rely on.
pub fn fnv1a64(seed: u64, bytes: &[u8]) -> u64 {
    let mut hash = FNV1A64_OFFSET ^ seed;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV1A64_PRIME);
    }
    hash
}

/// Hash a sequence of string parts, separated so that `("ab", "c")` and
/// `("a", "bc")` never collide.
pub fn stable_hash_parts<I, S>(seed: u64, parts: I) -> u64
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hash = fnv1a64(seed, &[]);
    for part in parts {
        hash = fnv1a64(hash, part.as_ref().as_bytes());
        hash = fnv1a64(hash, &[PART_SEPARATOR]);
    }
    hash
}

/// SplitMix64 finalizer, used to decorrelate sub-seeds derived from one key.
pub fn mix64(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_hash_is_fixed_across_runs() {
        // Pinned so accidental changes to seed derivation are caught.
        assert_eq!(fnv1a64(0, b""), FNV1A64_OFFSET);
        assert_eq!(fnv1a64(0, b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn part_boundaries_matter() {
        let left = stable_hash_parts(7, ["ab", "c"]);
        let right = stable_hash_parts(7, ["a", "bc"]);
        assert_ne!(left, right);
        assert_eq!(left, stable_hash_parts(7, ["ab", "c"]));
    }

    #[test]
    fn mix64_spreads_adjacent_inputs() {
        let a = mix64(1);
        let b = mix64(2);
        assert_ne!(a, b);
        assert!((a ^ b).count_ones() > 8);
    }
}
