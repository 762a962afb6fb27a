//! Packed 4-bit saturating counters, two per byte.
//!
//! The low nibble holds even indices, the high nibble odd indices. All
//! saturation and underflow handling lives here so call sites never touch
//! the bit packing directly.

/// Largest value a 4-bit counter can hold.
pub const COUNTER_MAX: u8 = 0x0f;

pub fn get_counter(counts: &[u8], pos: u64) -> u8 {
    let byte = counts[(pos / 2) as usize];
    if pos % 2 == 0 {
        byte & 0x0f
    } else {
        (byte & 0xf0) >> 4
    }
}

pub fn set_counter(counts: &mut [u8], pos: u64, value: u8) {
    let slot = &mut counts[(pos / 2) as usize];
    if pos % 2 == 0 {
        *slot = (*slot & 0xf0) | (value & 0x0f);
    } else {
        *slot = (*slot & 0x0f) | ((value & 0x0f) << 4);
    }
}

/// Increments the counter at `pos`, saturating at 15. Returns false when
/// the counter was already pinned at the maximum, which makes presence for
/// that slot permanent.
pub fn increment_saturating(counts: &mut [u8], pos: u64) -> bool {
    let current = get_counter(counts, pos);
    if current < COUNTER_MAX {
        set_counter(counts, pos, current + 1);
        true
    } else {
        false
    }
}

/// Decrements the counter at `pos`, stopping at 0. Returns false when the
/// counter was already zero, which signals a removal for an item that was
/// never added.
pub fn decrement_to_floor(counts: &mut [u8], pos: u64) -> bool {
    let current = get_counter(counts, pos);
    if current > 0 {
        set_counter(counts, pos, current - 1);
        true
    } else {
        false
    }
}
