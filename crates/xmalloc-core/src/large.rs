//! Large allocations.
//!
//! A request that exceeds the largest size class gets a dedicated mapping
//! rounded up to whole pages: a chunk header, one back-reference word, and
//! the caller's bytes. The mapping is self-describing — `class_id` is the
//! [`LARGE_CLASS`] sentinel and `chunk_size` records what to unmap — so
//! the path touches no arena state and takes no lock.

use core::ptr;

use crate::chunk::{CHUNK_HEADER_SIZE, ChunkHeader, SLOT_BACKREF_SIZE};
use crate::occupancy::OccupancyMap;
use crate::page::{self, ENOMEM, MapError};
use crate::size_class::LARGE_CLASS;

/// Maps a fresh region for `user_size` caller bytes and returns the
/// caller pointer. Fatal if the kernel refuses.
pub(crate) fn allocate_large(user_size: usize) -> *mut u8 {
    let total = match user_size.checked_add(CHUNK_HEADER_SIZE + SLOT_BACKREF_SIZE) {
        Some(total) => total,
        None => page::oom_abort(&MapError {
            len: user_size,
            errno: ENOMEM,
        }),
    };
    let len = page::round_to_pages(total);
    let base = match page::map(len) {
        Ok(region) => region.as_ptr(),
        Err(err) => page::oom_abort(&err),
    };

    let chunk = base.cast::<ChunkHeader>();
    // SAFETY: base heads a fresh mapping of len >= total bytes,
    // exclusively ours; header and back-reference stores are aligned.
    unsafe {
        chunk.write(ChunkHeader {
            chunk_size: len,
            class_id: LARGE_CLASS,
            arena_index: 0,
            // Single implicit slot; the map is never scanned.
            occupancy: OccupancyMap::FULL,
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        });
        let slot = base as usize + CHUNK_HEADER_SIZE;
        (slot as *mut *mut ChunkHeader).write(chunk);
        (slot + SLOT_BACKREF_SIZE) as *mut u8
    }
}

/// Releases a large chunk's entire mapping.
///
/// # Safety
///
/// `chunk` must head a live large chunk created by [`allocate_large`];
/// no pointer into it may be used afterwards.
pub(crate) unsafe fn free_large(chunk: *mut ChunkHeader) {
    // SAFETY: chunk_size records the mapped length; the caller hands over
    // the whole mapping.
    unsafe {
        let len = (*chunk).chunk_size;
        page::unmap(chunk.cast(), len);
    }
}
