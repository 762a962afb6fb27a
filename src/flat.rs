use bitvec::{bitvec, order::Lsb0, vec::BitVec};

use crate::config::FilterConfig;
use crate::error::Result;
use crate::hash::index_hashes;
use crate::traits::FilterOps;

/// Single-generation Bloom filter over a plain bit vector. One bit per
/// slot, no counters, no persistence. Possible false positives, never
/// false negatives.
pub struct FlatFilter {
    bits: BitVec<usize, Lsb0>,
    bit_count: u64,
    hash_count: u32,
    insert_count: u64,
}

impl FlatFilter {
    /// Creates a filter with an explicit bit count and hash function count.
    /// The bit count is floored at 1 so index reduction always has a
    /// non-zero modulus.
    pub fn new(bits: u64, hash_count: u32) -> Self {
        let bits = bits.max(1);
        Self {
            bits: bitvec![0; bits as usize],
            bit_count: bits,
            hash_count,
            insert_count: 0,
        }
    }

    /// Creates a filter sized from (capacity, error rate) via the standard
    /// parameter derivation.
    pub fn with_config(config: &FilterConfig) -> Result<Self> {
        let params = config.validate()?;
        Ok(Self::new(params.total_bits, params.hash_count))
    }

    /// Sets every bit selected for `data`. Returns true when all of them
    /// were already set, i.e. the item appeared present before this call.
    pub fn add(&mut self, data: &[u8]) -> bool {
        let mut present = true;
        for index in index_hashes(data, self.hash_count, self.bit_count) {
            let index = index as usize;
            if !self.bits[index] {
                present = false;
                self.bits.set(index, true);
            }
        }
        self.insert_count += 1;
        present
    }

    /// True iff every selected bit is set.
    pub fn check(&self, data: &[u8]) -> bool {
        index_hashes(data, self.hash_count, self.bit_count)
            .into_iter()
            .all(|index| self.bits[index as usize])
    }

    pub fn clear(&mut self) {
        self.bits.fill(false);
        self.insert_count = 0;
    }

    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    pub fn hash_count(&self) -> u32 {
        self.hash_count
    }

    pub fn insert_count(&self) -> u64 {
        self.insert_count
    }
}

impl FilterOps for FlatFilter {
    fn add(&mut self, item: &[u8]) -> Result<bool> {
        Ok(FlatFilter::add(self, item))
    }

    fn check(&self, item: &[u8]) -> bool {
        FlatFilter::check(self, item)
    }
}
