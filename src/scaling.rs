use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::FilterConfig;
use crate::counters;
use crate::error::{FilterError, Result};
use crate::hash::index_hashes;
use crate::params::FilterParameters;
use crate::store::BitStore;
use crate::traits::{FilterOps, FilterStats};

/// Each new generation tightens its target error rate by this factor so
/// the compound false-positive probability stays bounded as the filter
/// grows.
const ERROR_TIGHTENING_RATIO: f64 = 0.5;

/// mem_seqnum, disk_seqnum, max_id.
const SCALING_HEADER_BYTES: u64 = 24;
/// count, id.
const GENERATION_HEADER_BYTES: u64 = 16;

const MEM_SEQNUM_OFFSET: u64 = 0;
const DISK_SEQNUM_OFFSET: u64 = 8;
const MAX_ID_OFFSET: u64 = 16;

/// One fixed-capacity counting filter carved out of the shared store.
///
/// Holds layout and derived parameters only. The mutable header fields
/// (element count, minimum accepted id) live in the mapped region and are
/// resolved through byte offsets at point of use, so a store relocation
/// never invalidates them.
#[derive(Debug, Clone)]
struct Generation {
    params: FilterParameters,
    counters_per_hash: u64,
    total_counters: u64,
    /// Byte offset of this generation's header within the store.
    offset: u64,
    /// Header plus packed counter bytes.
    num_bytes: u64,
}

impl Generation {
    fn layout(capacity: u64, error_rate: f64, offset: u64) -> Result<Self> {
        let params = FilterParameters::derive(capacity, error_rate)?;
        let counters_per_hash = params.counters_per_hash();
        let total_counters = params.total_counters();
        let num_bytes = GENERATION_HEADER_BYTES + params.counter_bytes();
        Ok(Self {
            params,
            counters_per_hash,
            total_counters,
            offset,
            num_bytes,
        })
    }

    fn count(&self, store: &BitStore) -> u64 {
        store.read_u64(self.offset)
    }

    fn set_count(&self, store: &mut BitStore, value: u64) {
        store.write_u64(self.offset, value);
    }

    fn min_id(&self, store: &BitStore) -> u64 {
        store.read_u64(self.offset + 8)
    }

    fn set_min_id(&self, store: &mut BitStore, value: u64) {
        store.write_u64(self.offset + 8, value);
    }

    fn slots(&self, data: &[u8]) -> Vec<u64> {
        index_hashes(data, self.params.hash_count, self.counters_per_hash)
            .into_iter()
            .enumerate()
            .map(|(i, index)| index + i as u64 * self.counters_per_hash)
            .collect()
    }

    fn region<'a>(&self, store: &'a BitStore) -> &'a [u8] {
        let start = (self.offset + GENERATION_HEADER_BYTES) as usize;
        &store.as_slice()[start..start + self.params.counter_bytes() as usize]
    }

    fn region_mut<'a>(&self, store: &'a mut BitStore) -> &'a mut [u8] {
        let start = (self.offset + GENERATION_HEADER_BYTES) as usize;
        let end = start + self.params.counter_bytes() as usize;
        &mut store.as_mut_slice()[start..end]
    }

    fn check(&self, store: &BitStore, data: &[u8]) -> bool {
        let region = self.region(store);
        self.slots(data)
            .iter()
            .all(|&slot| counters::get_counter(region, slot) != 0)
    }

    fn add(&self, store: &mut BitStore, data: &[u8]) {
        let slots = self.slots(data);
        {
            let region = self.region_mut(store);
            for &slot in &slots {
                if !counters::increment_saturating(region, slot) {
                    warn!(slot, "4-bit counter saturated; slot presence is now permanent");
                }
            }
        }
        let count = self.count(store);
        self.set_count(store, count + 1);
    }

    fn remove(&self, store: &mut BitStore, data: &[u8]) {
        let slots = self.slots(data);
        {
            let region = self.region_mut(store);
            for &slot in &slots {
                if !counters::decrement_to_floor(region, slot) {
                    warn!(slot, "decrement of zero counter; item was never added");
                }
            }
        }
        let count = self.count(store);
        self.set_count(store, count.saturating_sub(1));
    }
}

/// Auto-scaling counting Bloom filter: an ordered list of generations with
/// geometrically tightening error rates, all carved out of one growable
/// memory-mapped file.
///
/// Elements carry an externally supplied, monotonically non-decreasing id
/// that routes insertions and removals to the generation that was active
/// when the id was issued. When the newest generation saturates, a fresh
/// one with a tighter error rate is appended.
///
/// Durability follows a two-phase seqnum protocol: `disk_seqnum` is cleared
/// and synced before the first mutation after a flush, and set back to
/// `mem_seqnum` (with a second sync) on `flush`. A reader that finds
/// `disk_seqnum == N != 0` may trust that all mutations up to `N` are
/// durable; zero means the image is potentially stale.
pub struct ScalingFilter {
    capacity: u64,
    error_rate: f64,
    generations: Vec<Generation>,
    store: BitStore,
}

impl ScalingFilter {
    /// Creates (or truncates) the backing file and initializes a filter
    /// with one generation.
    pub fn create<P: AsRef<Path>>(config: &FilterConfig, path: P) -> Result<Self> {
        config.validate()?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        let store = BitStore::create(file, SCALING_HEADER_BYTES)?;

        let mut filter = Self {
            capacity: config.capacity,
            error_rate: config.error_rate,
            generations: Vec::new(),
            store,
        };
        let index = filter.append_generation()?;
        let generation = &filter.generations[index];
        generation.set_count(&mut filter.store, 0);
        generation.set_min_id(&mut filter.store, 0);

        filter.store.write_u64(MEM_SEQNUM_OFFSET, 1);
        info!(
            path = %path.as_ref().display(),
            capacity = config.capacity,
            error_rate = config.error_rate,
            "created scaling filter"
        );
        Ok(filter)
    }

    /// Reopens a filter previously created with the same capacity and
    /// error rate. The generation list is reconstructed by recomputing
    /// generation sizes until the file is exactly consumed; any leftover
    /// or missing bytes mean the file is corrupt or the parameters differ
    /// from creation time.
    pub fn open<P: AsRef<Path>>(config: &FilterConfig, path: P) -> Result<Self> {
        config.validate()?;
        let file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;
        let size = file.metadata()?.len();
        if size < SCALING_HEADER_BYTES {
            return Err(FilterError::SizeMismatch {
                expected: SCALING_HEADER_BYTES,
                actual: size,
            });
        }
        let store = BitStore::open(file)?;

        let mut filter = Self {
            capacity: config.capacity,
            error_rate: config.error_rate,
            generations: Vec::new(),
            store,
        };

        let mut consumed = SCALING_HEADER_BYTES;
        while consumed < size {
            let generation = filter.next_generation_layout(consumed)?;
            consumed += generation.num_bytes;
            if consumed > size {
                return Err(FilterError::SizeMismatch {
                    expected: consumed,
                    actual: size,
                });
            }
            // Header count and id stay as persisted.
            filter.generations.push(generation);
        }

        // A header with no generations can be left behind by a crash
        // between writing the header and appending generation 0.
        if filter.generations.is_empty() {
            let first = filter.next_generation_layout(SCALING_HEADER_BYTES)?;
            return Err(FilterError::SizeMismatch {
                expected: SCALING_HEADER_BYTES + first.num_bytes,
                actual: size,
            });
        }

        debug!(
            path = %path.as_ref().display(),
            generations = filter.generations.len(),
            bytes = size,
            "opened scaling filter"
        );
        Ok(filter)
    }

    fn next_generation_layout(&self, offset: u64) -> Result<Generation> {
        let tightened = self.error_rate
            * ERROR_TIGHTENING_RATIO.powi(self.generations.len() as i32 + 1);
        Generation::layout(self.capacity, tightened, offset)
    }

    /// Appends a generation at the end of the store, growing it by exactly
    /// the generation's byte length. The file extension zero-fills the new
    /// region, so its counters start cleared.
    fn append_generation(&mut self) -> Result<usize> {
        let offset = self.store.len();
        let generation = self.next_generation_layout(offset)?;
        self.store.grow(offset + generation.num_bytes)?;
        debug!(
            index = self.generations.len(),
            error_rate = generation.params.target_error_rate,
            bytes = generation.num_bytes,
            "appended generation"
        );
        self.generations.push(generation);
        Ok(self.generations.len() - 1)
    }

    /// First phase of the commit protocol: prove the on-disk image is
    /// stale before any counter changes. Returns the sequence number the
    /// caller must write back, incremented, once its mutation is applied.
    fn clear_seqnums(&mut self) -> Result<u64> {
        if self.store.read_u64(DISK_SEQNUM_OFFSET) != 0 {
            // disk_seqnum reaches the disk as zero before any other change
            self.store.write_u64(DISK_SEQNUM_OFFSET, 0);
            self.store.flush()?;
        }
        let seqnum = self.store.read_u64(MEM_SEQNUM_OFFSET);
        self.store.write_u64(MEM_SEQNUM_OFFSET, 0);
        Ok(seqnum)
    }

    /// Inserts `data` under `id`, reporting whether it already appeared
    /// present. A hit in any generation returns true without mutating.
    /// Otherwise the insert goes to the newest generation already covering
    /// `id`; a saturated newest generation triggers growth first.
    pub fn add(&mut self, data: &[u8], id: u64) -> Result<bool> {
        for generation in self.generations.iter().rev() {
            if generation.check(&self.store, data) {
                return Ok(true);
            }
        }

        let mut target = self
            .generations
            .iter()
            .rposition(|generation| generation.min_id(&self.store) <= id)
            .unwrap_or(self.generations.len() - 1);

        let seqnum = self.clear_seqnums()?;

        let max_id = self.store.read_u64(MAX_ID_OFFSET);
        if id > max_id
            && self.generations[target].count(&self.store) >= self.capacity - 1
        {
            target = self.append_generation()?;
            let generation = &self.generations[target];
            generation.set_count(&mut self.store, 0);
            generation.set_min_id(&mut self.store, max_id + 1);
        }
        if id > max_id {
            self.store.write_u64(MAX_ID_OFFSET, id);
        }

        let generation = &self.generations[target];
        generation.add(&mut self.store, data);

        self.store.write_u64(MEM_SEQNUM_OFFSET, seqnum + 1);
        Ok(false)
    }

    /// Removes `data` from the newest generation whose minimum id covers
    /// `id`. Returns false (no-op) when no generation matches.
    pub fn remove(&mut self, data: &[u8], id: u64) -> Result<bool> {
        let Some(target) = self
            .generations
            .iter()
            .rposition(|generation| generation.min_id(&self.store) <= id)
        else {
            return Ok(false);
        };

        let seqnum = self.clear_seqnums()?;
        let generation = &self.generations[target];
        generation.remove(&mut self.store, data);
        self.store.write_u64(MEM_SEQNUM_OFFSET, seqnum + 1);
        Ok(true)
    }

    /// Newest-first scan across all generations; true on first hit.
    /// Worst-case cost is O(generations * hash_count) for absent elements.
    pub fn check(&self, data: &[u8]) -> bool {
        self.generations
            .iter()
            .rev()
            .any(|generation| generation.check(&self.store, data))
    }

    /// Syncs all counter data, then publishes the current `mem_seqnum` as
    /// `disk_seqnum` with a second sync (commit phase two).
    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()?;
        // all changes durable before disk_seqnum is set
        if self.store.read_u64(DISK_SEQNUM_OFFSET) == 0 {
            let seqnum = self.store.read_u64(MEM_SEQNUM_OFFSET);
            self.store.write_u64(DISK_SEQNUM_OFFSET, seqnum);
            self.store.flush()?;
        }
        Ok(())
    }

    pub fn mem_seqnum(&self) -> u64 {
        self.store.read_u64(MEM_SEQNUM_OFFSET)
    }

    pub fn disk_seqnum(&self) -> u64 {
        self.store.read_u64(DISK_SEQNUM_OFFSET)
    }

    pub fn max_id(&self) -> u64 {
        self.store.read_u64(MAX_ID_OFFSET)
    }

    pub fn generation_count(&self) -> usize {
        self.generations.len()
    }

    /// Total 4-bit counters across all generations.
    pub fn bit_count(&self) -> u64 {
        self.generations
            .iter()
            .map(|generation| generation.total_counters)
            .sum()
    }

    /// Hash function count of the newest generation.
    pub fn hash_count(&self) -> u32 {
        self.generations
            .last()
            .map(|generation| generation.params.hash_count)
            .unwrap_or(0)
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Sum of the element counts of all generations.
    pub fn element_count(&self) -> u64 {
        self.generations
            .iter()
            .map(|generation| generation.count(&self.store))
            .sum()
    }

    /// Read-only view of configuration and counters for diagnostics.
    pub fn snapshot(&self) -> ScalingSnapshot {
        ScalingSnapshot {
            capacity: self.capacity,
            error_rate: self.error_rate,
            generation_count: self.generations.len(),
            total_counters: self.bit_count(),
            element_count: self.element_count(),
            file_bytes: self.store.len(),
            mem_seqnum: self.mem_seqnum(),
            disk_seqnum: self.disk_seqnum(),
            max_id: self.max_id(),
            generations: self
                .generations
                .iter()
                .map(|generation| GenerationSnapshot {
                    capacity: generation.params.capacity,
                    error_rate: generation.params.target_error_rate,
                    hash_count: generation.params.hash_count,
                    counters_per_hash: generation.counters_per_hash,
                    total_counters: generation.total_counters,
                    byte_offset: generation.offset,
                    count: generation.count(&self.store),
                    min_id: generation.min_id(&self.store),
                })
                .collect(),
        }
    }
}

impl FilterOps for ScalingFilter {
    /// Trait-level inserts assign ids internally as `max_id + 1`, so growth
    /// on saturation still triggers for callers that do not track ids.
    fn add(&mut self, item: &[u8]) -> Result<bool> {
        let id = self.max_id() + 1;
        ScalingFilter::add(self, item, id)
    }

    fn check(&self, item: &[u8]) -> bool {
        ScalingFilter::check(self, item)
    }
}

impl FilterStats for ScalingFilter {
    fn capacity(&self) -> u64 {
        ScalingFilter::capacity(self)
    }

    fn error_rate(&self) -> f64 {
        ScalingFilter::error_rate(self)
    }

    fn element_count(&self) -> u64 {
        ScalingFilter::element_count(self)
    }
}

/// Per-generation slice of a [`ScalingSnapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSnapshot {
    pub capacity: u64,
    pub error_rate: f64,
    pub hash_count: u32,
    pub counters_per_hash: u64,
    pub total_counters: u64,
    pub byte_offset: u64,
    pub count: u64,
    pub min_id: u64,
}

/// Snapshot of a scaling filter's configuration and counters, taken for
/// diagnostic printing. Values are a point-in-time copy with no behavior
/// contract beyond being readable.
#[derive(Debug, Clone, Serialize)]
pub struct ScalingSnapshot {
    pub capacity: u64,
    pub error_rate: f64,
    pub generation_count: usize,
    pub total_counters: u64,
    pub element_count: u64,
    pub file_bytes: u64,
    pub mem_seqnum: u64,
    pub disk_seqnum: u64,
    pub max_id: u64,
    pub generations: Vec<GenerationSnapshot>,
}
