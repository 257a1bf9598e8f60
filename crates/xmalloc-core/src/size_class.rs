//! Size classes for bucketed allocations.
//!
//! A compile-time table of `(slot_size, chunk_pages, slot_count)` triples,
//! sorted by `slot_size` strictly ascending. `slot_size` includes the
//! slot's back-reference word, so a request is matched against its total
//! footprint, not the caller-visible byte count. The ladder keeps the
//! small steps of common object sizes at the bottom and header-padded
//! powers of two above them, ending at 4 KiB + header.

use crate::occupancy::OccupancyMap;

/// Number of size classes.
pub const NUM_SIZE_CLASSES: usize = 10;

/// Reserved `class_id` marking a chunk as a large, non-bucketed
/// allocation.
pub const LARGE_CLASS: usize = usize::MAX;

/// One entry of the class table.
#[derive(Clone, Copy, Debug)]
pub struct SizeClass {
    /// Slot size in bytes, back-reference included. Always a multiple of
    /// the fundamental alignment.
    pub slot_size: usize,
    /// Pages per chunk for this class.
    pub chunk_pages: usize,
    /// Slots per chunk; at most [`crate::occupancy::MAP_BITS`], and
    /// `slot_size * slot_count + CHUNK_HEADER_SIZE` fits the chunk.
    pub slot_count: usize,
}

const fn class(slot_size: usize, chunk_pages: usize, slot_count: usize) -> SizeClass {
    SizeClass {
        slot_size,
        chunk_pages,
        slot_count,
    }
}

/// The class table.
pub const SIZE_CLASSES: [SizeClass; NUM_SIZE_CLASSES] = [
    class(24, 1, 167),
    class(40, 1, 100),
    class(48, 1, 83),
    class(72, 1, 55),
    class(136, 2, 59),
    class(264, 2, 30),
    class(520, 4, 31),
    class(1032, 4, 15),
    class(2056, 4, 7),
    class(4104, 8, 7),
];

/// Canonical empty occupancy pattern per class: sentinel bits set,
/// in-range bits clear. A chunk whose map equals its class's pattern
/// holds no live slots.
pub const EMPTY_PATTERNS: [OccupancyMap; NUM_SIZE_CLASSES] = {
    let mut patterns = [OccupancyMap::FULL; NUM_SIZE_CLASSES];
    let mut i = 0;
    while i < NUM_SIZE_CLASSES {
        patterns[i] = OccupancyMap::seeded(SIZE_CLASSES[i].slot_count);
        i += 1;
    }
    patterns
};

/// Smallest class whose slot holds `total_size` bytes (back-reference
/// included), or `None` when the request exceeds every class and must go
/// to the large path.
///
/// A linear scan is sufficient for a table this small.
pub fn class_for(total_size: usize) -> Option<usize> {
    SIZE_CLASSES
        .iter()
        .position(|class| total_size <= class.slot_size)
}
