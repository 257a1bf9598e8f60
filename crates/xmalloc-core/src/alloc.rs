//! Dispatch layer: the three public operations.
//!
//! `allocate` rounds the caller-visible size up to its total footprint
//! (back-reference included), selects a size class by scanning the table,
//! and hands the request to the bucketed engine or the large path.
//! `free` follows the slot's back-reference to pick the reverse path.
//! `reallocate` is allocate + copy-min + free; no in-place resizing is
//! attempted.

use core::ptr;

use crate::arena;
use crate::chunk::{self, CHUNK_HEADER_SIZE, SLOT_BACKREF_SIZE};
use crate::large;
use crate::page::{self, ENOMEM, MapError};
use crate::size_class::{self, LARGE_CLASS, SIZE_CLASSES};

/// Allocates `n` bytes.
///
/// The returned pointer is never null, is aligned for any fundamental
/// type, and stays valid until passed to [`free`] or [`reallocate`]. A
/// refused OS mapping is fatal (see [`page::oom_abort`]); there is no
/// error return.
pub fn allocate(n: usize) -> *mut u8 {
    let total = match n.checked_add(SLOT_BACKREF_SIZE) {
        Some(total) => total,
        None => page::oom_abort(&MapError {
            len: n,
            errno: ENOMEM,
        }),
    };
    match size_class::class_for(total) {
        Some(class_id) => arena::allocate_bucketed(class_id),
        None => large::allocate_large(n),
    }
}

/// Frees a pointer previously returned by [`allocate`] or
/// [`reallocate`]. Null is a no-op.
///
/// # Safety
///
/// `p` must be null or a pointer returned by this allocator that has not
/// been freed since. Freeing foreign pointers, freed pointers, or
/// interior pointers is undefined behavior; no detection is attempted.
pub unsafe fn free(p: *mut u8) {
    if p.is_null() {
        return;
    }
    // SAFETY: per the caller contract, p carries a valid back-reference.
    unsafe {
        let owner = chunk::owner_of(p);
        if (*owner).class_id == LARGE_CLASS {
            large::free_large(owner);
        } else {
            arena::free_bucketed(owner, p);
        }
    }
}

/// Resizes the allocation at `p` to `n` bytes, moving it.
///
/// The first `min(old capacity, n)` bytes are preserved; the returned
/// pointer may differ from `p`, and `p` is invalid afterwards. A null `p`
/// is equivalent to `allocate(n)`; `n == 0` with a non-null `p` frees it
/// and returns null.
///
/// # Safety
///
/// Same contract as [`free`] for non-null `p`.
pub unsafe fn reallocate(p: *mut u8, n: usize) -> *mut u8 {
    if p.is_null() {
        return allocate(n);
    }
    if n == 0 {
        // SAFETY: forwarded caller contract.
        unsafe { free(p) };
        return ptr::null_mut();
    }

    // SAFETY: p is live, so its back-reference and the owning chunk's
    // immutable fields are readable without a lock; the copy source stays
    // valid until the free below.
    unsafe {
        let owner = chunk::owner_of(p);
        let capacity = if (*owner).class_id == LARGE_CLASS {
            (*owner).chunk_size - CHUNK_HEADER_SIZE - SLOT_BACKREF_SIZE
        } else {
            SIZE_CLASSES[(*owner).class_id].slot_size - SLOT_BACKREF_SIZE
        };

        let fresh = allocate(n);
        ptr::copy_nonoverlapping(p, fresh, capacity.min(n));
        free(p);
        fresh
    }
}
