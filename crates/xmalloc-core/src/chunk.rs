//! Chunk layout and slot carving.
//!
//! A chunk is one OS mapping. It begins with a [`ChunkHeader`]; for a
//! bucketed chunk the rest of the mapping is an array of equal-sized
//! slots. Every slot starts with a back-reference word naming the owning
//! chunk, and the caller-visible pointer is the byte immediately after
//! it — so free recovers the chunk, its class, and its arena in O(1)
//! with no global lookup.

use core::ptr;

use crate::occupancy::OccupancyMap;
use crate::page::{self, PAGE_SIZE};
use crate::size_class::{EMPTY_PATTERNS, LARGE_CLASS, SIZE_CLASSES};

/// Header at the start of every mapping the allocator owns.
///
/// `chunk_size`, `class_id`, and `arena_index` are immutable after
/// creation and may be read without the arena lock; `occupancy` and the
/// ring links are mutated only under the owning arena's mutex.
#[repr(C)]
pub struct ChunkHeader {
    /// Size in bytes of the whole mapping, as passed to the OS layer.
    pub chunk_size: usize,
    /// Index into the size-class table, or [`LARGE_CLASS`].
    pub class_id: usize,
    /// Index of the owning arena. Meaningless for large chunks.
    pub arena_index: usize,
    /// Per-slot occupancy. Sentinel-seeded for bucketed chunks; unused
    /// (held at `FULL`) for large chunks and list sentinels.
    pub occupancy: OccupancyMap,
    /// Previous chunk in the class ring.
    pub prev: *mut ChunkHeader,
    /// Next chunk in the class ring.
    pub next: *mut ChunkHeader,
}

/// Byte size of the chunk header; the slot array begins right after it.
pub const CHUNK_HEADER_SIZE: usize = size_of::<ChunkHeader>();

/// Byte size of the back-reference word prefixed to every slot.
pub const SLOT_BACKREF_SIZE: usize = size_of::<*mut ChunkHeader>();

impl ChunkHeader {
    /// A list sentinel: full occupancy, unlinked. The ring links are
    /// installed by arena initialization.
    pub const fn sentinel() -> Self {
        Self {
            chunk_size: 0,
            class_id: LARGE_CLASS,
            arena_index: 0,
            occupancy: OccupancyMap::FULL,
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }
}

/// Address of the first slot of a bucketed chunk.
pub fn slot_array_base(chunk: *mut ChunkHeader) -> usize {
    chunk as usize + CHUNK_HEADER_SIZE
}

/// Maps and initializes a fresh bucketed chunk for `class_id`, owned by
/// `arena_index`. Fatal if the kernel refuses the mapping.
///
/// The chunk is returned unlinked; the caller links it into its class
/// ring under the arena lock.
pub fn new_bucketed(class_id: usize, arena_index: usize) -> *mut ChunkHeader {
    let len = SIZE_CLASSES[class_id].chunk_pages * PAGE_SIZE;
    let base = match page::map(len) {
        Ok(region) => region.as_ptr(),
        Err(err) => page::oom_abort(&err),
    };

    let chunk = base.cast::<ChunkHeader>();
    // SAFETY: base heads a fresh mapping of len >= CHUNK_HEADER_SIZE
    // page-aligned bytes, exclusively ours.
    unsafe {
        chunk.write(ChunkHeader {
            chunk_size: len,
            class_id,
            arena_index,
            occupancy: EMPTY_PATTERNS[class_id],
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        });
    }
    chunk
}

/// Writes the back-reference of slot `slot_index` and returns the
/// caller-visible pointer.
///
/// # Safety
///
/// `chunk` must be a live bucketed chunk and `slot_index` a slot the
/// caller has just claimed in its occupancy map under the arena lock.
pub unsafe fn carve_slot(chunk: *mut ChunkHeader, slot_index: usize) -> *mut u8 {
    // SAFETY: the claimed slot lies inside the chunk's slot array; slot
    // addresses are aligned for a pointer store.
    unsafe {
        let slot_size = SIZE_CLASSES[(*chunk).class_id].slot_size;
        let slot = slot_array_base(chunk) + slot_index * slot_size;
        (slot as *mut *mut ChunkHeader).write(chunk);
        (slot + SLOT_BACKREF_SIZE) as *mut u8
    }
}

/// Recovers the owning chunk of a caller pointer from its back-reference.
///
/// # Safety
///
/// `user` must be a pointer previously returned by this allocator and not
/// yet freed.
pub unsafe fn owner_of(user: *mut u8) -> *mut ChunkHeader {
    // SAFETY: the back-reference word sits immediately before the caller
    // pointer and was written when the slot was carved.
    unsafe { user.sub(SLOT_BACKREF_SIZE).cast::<*mut ChunkHeader>().read() }
}

/// Index of the slot holding `user` within its bucketed chunk.
///
/// # Safety
///
/// `user` must be a live caller pointer whose back-reference names
/// `chunk`, and `chunk` must be bucketed.
pub unsafe fn slot_index_of(chunk: *mut ChunkHeader, user: *mut u8) -> usize {
    let slot = user as usize - SLOT_BACKREF_SIZE;
    // SAFETY: class_id is immutable after chunk creation.
    let slot_size = unsafe { SIZE_CLASSES[(*chunk).class_id].slot_size };
    (slot - slot_array_base(chunk)) / slot_size
}
