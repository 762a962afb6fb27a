use murmur3::murmur3_x64_128;
use std::io::Cursor;

/// Fixed salt fed to the 128-bit mixing hash. Part of the on-disk format:
/// changing it invalidates every persisted filter.
pub const SALT_CONSTANT: u32 = 0x97c2_9b3a;

/// One 128-bit MurmurHash3 (x64 variant) of `data`, split into the two
/// 64-bit base hashes used for double hashing. `h1` is the low half, `h2`
/// the high half. Deterministic across runs and platforms; no per-process
/// randomization.
pub(crate) fn mixing_hash(data: &[u8]) -> (u64, u64) {
    let mut cursor = Cursor::new(data);
    let hash = murmur3_x64_128(&mut cursor, SALT_CONSTANT)
        .expect("Failed to compute Murmur3 hash");
    (hash as u64, (hash >> 64) as u64)
}

/// Computes `hash_count` slot indices for `data`, each in `[0, modulus)`.
///
/// Uses the Kirsch-Mitzenmacher double hashing construction: two base
/// hashes from one 128-bit digest, combined linearly as `h1 + i * h2`.
/// This must stay bit-exact so previously written filter files remain
/// readable.
pub fn index_hashes(data: &[u8], hash_count: u32, modulus: u64) -> Vec<u64> {
    let (h1, h2) = mixing_hash(data);
    (0..u64::from(hash_count))
        .map(|i| h1.wrapping_add(i.wrapping_mul(h2)) % modulus)
        .collect()
}
