//! Approximate set-membership structures for deduplicating a stream of
//! opaque byte records under bounded memory, with a caller-chosen false
//! positive rate.
//!
//! Three variants share one parameter derivation and one hashing scheme:
//!    * [`FlatFilter`]: single bit vector, no removal, no persistence.
//!    * [`CountingFilter`]: 4-bit saturating counters packed two per byte,
//!      supporting removal and approximate multiplicity.
//!    * [`ScalingFilter`]: an ordered list of counting-filter "generations"
//!      carved out of one growable memory-mapped file.
//!
//! How the scaling filter grows:
//!    * Each generation is a fixed-capacity counting filter; elements carry
//!      a monotonically non-decreasing id that routes inserts and removals
//!      to the generation that was active when the id was issued.
//!    * When the newest generation saturates, a new one is appended with
//!      its target error rate tightened by 0.5, keeping the compound false
//!      positive probability bounded as the filter scales.
//!    * All generations live in a single file. Reopening with the original
//!      (capacity, error rate) reconstructs the generation layout from the
//!      file size alone; a mismatched size is rejected as corrupt.
//!
//! Durability:
//!    * A two-phase seqnum protocol makes the persisted image auditable:
//!      `disk_seqnum` is cleared and synced before the first mutation after
//!      a flush, and republished as the current `mem_seqnum` on `flush()`.
//!      A nonzero `disk_seqnum` therefore proves all mutations up to that
//!      sequence are durable.
//!
//! Known limits:
//!    * False positives are a documented probability, not an error; there
//!      are no false negatives.
//!    * No internal locking: callers either serialize access behind a
//!      mutex or give each worker its own filter.
//!    * A file must not be mapped by two filter instances at once.

mod config;
mod counters;
mod counting;
mod error;
mod flat;
mod hash;
mod params;
mod scaling;
mod store;
mod traits;

pub use config::{FilterConfig, FilterConfigBuilder, FilterConfigBuilderError};
pub use counting::CountingFilter;
pub use error::{FilterError, Result};
pub use flat::FlatFilter;
pub use hash::{SALT_CONSTANT, index_hashes};
pub use params::{FilterParameters, MIN_CAPACITY};
pub use scaling::{GenerationSnapshot, ScalingFilter, ScalingSnapshot};
pub use store::BitStore;
pub use traits::{FilterOps, FilterStats};
