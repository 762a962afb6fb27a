use crate::error::{FilterError, Result};

/// Smallest capacity worth sizing a filter for. Below this the header
/// overhead dominates and parameter rounding distorts the error rate.
pub const MIN_CAPACITY: u64 = 1000;

/// Sizing parameters derived once from (capacity, error rate) and immutable
/// thereafter. Every filter variant starts here.
///
/// The classic Bloom relations apply:
/// `bits_per_element = -ln(error_rate) / ln(2)^2`,
/// `total_bits = round(capacity * bits_per_element)`,
/// `hash_count = ceil(ln(2) * bits_per_element)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParameters {
    pub capacity: u64,
    pub target_error_rate: f64,
    pub bits_per_element: f64,
    pub total_bits: u64,
    pub hash_count: u32,
}

impl FilterParameters {
    pub fn derive(capacity: u64, error_rate: f64) -> Result<Self> {
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(FilterError::InvalidErrorRate(error_rate));
        }
        if capacity < MIN_CAPACITY {
            return Err(FilterError::InvalidCapacity(capacity));
        }

        let ln2 = std::f64::consts::LN_2;
        let bits_per_element = -error_rate.ln() / (ln2 * ln2);

        let total = capacity as f64 * bits_per_element;
        if !total.is_finite() || total >= u64::MAX as f64 {
            return Err(FilterError::InvalidCapacity(capacity));
        }

        let total_bits = total.round() as u64;
        // Rates close enough to 1 round the sizing down to zero bits,
        // which would leave nothing to hash into.
        if total_bits == 0 {
            return Err(FilterError::InvalidErrorRate(error_rate));
        }

        Ok(Self {
            capacity,
            target_error_rate: error_rate,
            bits_per_element,
            total_bits,
            hash_count: (ln2 * bits_per_element).ceil() as u32,
        })
    }

    /// Counters in each per-hash partition of a counting filter.
    pub fn counters_per_hash(&self) -> u64 {
        self.total_bits.div_ceil(u64::from(self.hash_count))
    }

    /// Total 4-bit counters, rounded up so every hash function gets a full
    /// partition.
    pub fn total_counters(&self) -> u64 {
        self.counters_per_hash() * u64::from(self.hash_count)
    }

    /// Bytes needed to store the packed counters, two per byte.
    pub fn counter_bytes(&self) -> u64 {
        self.total_counters().div_ceil(2)
    }
}
