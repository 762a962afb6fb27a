use tracing::warn;

use crate::config::FilterConfig;
use crate::counters;
use crate::error::Result;
use crate::hash::index_hashes;
use crate::params::FilterParameters;
use crate::traits::{FilterOps, FilterStats};

/// Single-generation counting Bloom filter with 4-bit saturating counters
/// packed two per byte. Supports removal and approximate multiplicity on
/// top of the usual add/check.
///
/// The counter array is partitioned per hash function: hash `i` addresses
/// the slice `[i * counters_per_hash, (i + 1) * counters_per_hash)`, which
/// keeps the hash functions independent without separate allocations.
pub struct CountingFilter {
    params: FilterParameters,
    counters_per_hash: u64,
    total_counters: u64,
    counts: Vec<u8>,
    element_count: u64,
    total_insertions: u64,
    unique_insertions: u64,
    saturation_events: u64,
    underflow_events: u64,
}

impl CountingFilter {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        let params = config.validate()?;
        let counters_per_hash = params.counters_per_hash();
        let total_counters = params.total_counters();
        let counts = vec![0u8; params.counter_bytes() as usize];

        Ok(Self {
            params,
            counters_per_hash,
            total_counters,
            counts,
            element_count: 0,
            total_insertions: 0,
            unique_insertions: 0,
            saturation_events: 0,
            underflow_events: 0,
        })
    }

    fn slots(&self, data: &[u8]) -> Vec<u64> {
        index_hashes(data, self.params.hash_count, self.counters_per_hash)
            .into_iter()
            .enumerate()
            .map(|(i, index)| index + i as u64 * self.counters_per_hash)
            .collect()
    }

    /// Increments every selected counter. Returns true when the item
    /// already appeared present (all counters were non-zero before the
    /// increment). A counter at 15 stays pinned; that is reported, not
    /// fatal.
    pub fn add(&mut self, data: &[u8]) -> bool {
        let slots = self.slots(data);
        let present = slots
            .iter()
            .all(|&slot| counters::get_counter(&self.counts, slot) != 0);

        for &slot in &slots {
            if !counters::increment_saturating(&mut self.counts, slot) {
                self.saturation_events += 1;
                warn!(slot, "4-bit counter saturated; slot presence is now permanent");
            }
        }

        self.element_count += 1;
        self.total_insertions += 1;
        if !present {
            self.unique_insertions += 1;
        }
        present
    }

    /// Decrements every selected counter. A counter already at zero is left
    /// there and reported; it signals a removal for an item never added.
    pub fn remove(&mut self, data: &[u8]) {
        for &slot in &self.slots(data) {
            if !counters::decrement_to_floor(&mut self.counts, slot) {
                self.underflow_events += 1;
                warn!(slot, "decrement of zero counter; item was never added");
            }
        }
        self.element_count = self.element_count.saturating_sub(1);
    }

    /// True iff every selected counter is non-zero. No mutation.
    pub fn check(&self, data: &[u8]) -> bool {
        self.slots(data)
            .iter()
            .all(|&slot| counters::get_counter(&self.counts, slot) != 0)
    }

    /// Minimum selected counter value: an upper bound on how many times
    /// `data` was inserted. Collisions can only inflate it.
    pub fn estimate_count(&self, data: &[u8]) -> u8 {
        self.slots(data)
            .iter()
            .map(|&slot| counters::get_counter(&self.counts, slot))
            .min()
            .unwrap_or(0)
    }

    /// Returns the estimate for `data` before insertion, then inserts.
    /// Avoids hashing twice for dedup-and-count workloads.
    pub fn check_and_add(&mut self, data: &[u8]) -> u8 {
        let slots = self.slots(data);
        let prior = slots
            .iter()
            .map(|&slot| counters::get_counter(&self.counts, slot))
            .min()
            .unwrap_or(0);

        for &slot in &slots {
            if !counters::increment_saturating(&mut self.counts, slot) {
                self.saturation_events += 1;
                warn!(slot, "4-bit counter saturated; slot presence is now permanent");
            }
        }

        self.element_count += 1;
        self.total_insertions += 1;
        if prior == 0 {
            self.unique_insertions += 1;
        }
        prior
    }

    /// Zeroes all counters and statistics, keeping the derived parameters.
    pub fn reset(&mut self) {
        self.counts.fill(0);
        self.element_count = 0;
        self.total_insertions = 0;
        self.unique_insertions = 0;
        self.saturation_events = 0;
        self.underflow_events = 0;
    }

    pub fn params(&self) -> &FilterParameters {
        &self.params
    }

    pub fn capacity(&self) -> u64 {
        self.params.capacity
    }

    pub fn error_rate(&self) -> f64 {
        self.params.target_error_rate
    }

    pub fn element_count(&self) -> u64 {
        self.element_count
    }

    pub fn hash_count(&self) -> u32 {
        self.params.hash_count
    }

    pub fn total_counters(&self) -> u64 {
        self.total_counters
    }

    pub fn total_insertions(&self) -> u64 {
        self.total_insertions
    }

    pub fn unique_insertions(&self) -> u64 {
        self.unique_insertions
    }

    pub fn saturation_events(&self) -> u64 {
        self.saturation_events
    }

    pub fn underflow_events(&self) -> u64 {
        self.underflow_events
    }
}

impl FilterOps for CountingFilter {
    fn add(&mut self, item: &[u8]) -> Result<bool> {
        Ok(CountingFilter::add(self, item))
    }

    fn check(&self, item: &[u8]) -> bool {
        CountingFilter::check(self, item)
    }
}

impl FilterStats for CountingFilter {
    fn capacity(&self) -> u64 {
        CountingFilter::capacity(self)
    }

    fn error_rate(&self) -> f64 {
        CountingFilter::error_rate(self)
    }

    fn element_count(&self) -> u64 {
        CountingFilter::element_count(self)
    }
}
