use crate::error::Result;

/// Common mutation/query surface shared by every filter variant so call
/// sites can stay polymorphic over "a filter with add and check".
pub trait FilterOps {
    /// Inserts `item`, reporting whether it already appeared present.
    fn add(&mut self, item: &[u8]) -> Result<bool>;

    /// True when `item` is possibly present; false when it is definitely
    /// absent. Never mutates filter state.
    fn check(&self, item: &[u8]) -> bool;
}

pub trait FilterStats {
    fn capacity(&self) -> u64;
    fn error_rate(&self) -> f64;
    fn element_count(&self) -> u64;
}
