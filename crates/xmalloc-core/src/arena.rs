//! Arenas: sharded, mutex-guarded chunk state.
//!
//! Allocator state is partitioned into a fixed small number of arenas.
//! Each arena owns one chunk ring per size class and a single mutex
//! guarding all of it. A thread allocates from whichever arena it can
//! lock without waiting, starting at its sticky preferred index, so under
//! low contention a thread stays put and under contention threads spread
//! out on their own. Free has no such freedom: a slot must return to the
//! chunk it came from, so the freeing thread blocks on the owning arena.
//!
//! Each class ring is doubly linked around a sentinel header whose
//! occupancy map is pre-seeded full, so the free-slot scan can treat the
//! sentinel like any other chunk and never carve from it.

use core::cell::Cell;

use parking_lot::{Mutex, MutexGuard, Once};

use crate::chunk::{self, ChunkHeader};
use crate::page;
use crate::size_class::{EMPTY_PATTERNS, NUM_SIZE_CLASSES};

/// Number of arenas. Compile-time fixed so the arena array is a static
/// layout; four suits modest multi-core workloads.
pub const NUM_ARENAS: usize = 4;

/// One class ring. The embedded sentinel is the ring head; its address is
/// stable because arenas live in a static.
struct ClassRing {
    head: ChunkHeader,
}

impl ClassRing {
    const fn new() -> Self {
        Self {
            head: ChunkHeader::sentinel(),
        }
    }

    fn sentinel(&mut self) -> *mut ChunkHeader {
        &mut self.head
    }
}

/// All state of one arena: one chunk ring per size class.
struct ArenaState {
    rings: [ClassRing; NUM_SIZE_CLASSES],
}

// SAFETY: the raw ring pointers inside are created from and into memory
// the arena owns, and are only dereferenced by the thread holding the
// owning arena's mutex.
unsafe impl Send for ArenaState {}

struct Arena {
    state: Mutex<ArenaState>,
}

impl Arena {
    const fn new() -> Self {
        Self {
            state: Mutex::new(ArenaState {
                rings: [const { ClassRing::new() }; NUM_SIZE_CLASSES],
            }),
        }
    }
}

static ARENAS: [Arena; NUM_ARENAS] = [const { Arena::new() }; NUM_ARENAS];

static RING_INIT: Once = Once::new();

thread_local! {
    /// Sticky arena hint for this thread's allocations.
    static PREFERRED_ARENA: Cell<usize> = const { Cell::new(0) };
}

/// Links every sentinel ring to itself, once per process. `Once` makes
/// concurrent first callers serialize only on the first call.
fn ensure_init() {
    RING_INIT.call_once(|| {
        for arena in &ARENAS {
            let mut state = arena.state.lock();
            for ring in &mut state.rings {
                let head = ring.sentinel();
                ring.head.prev = head;
                ring.head.next = head;
            }
        }
    });
}

/// Locks some arena: round-robin `try_lock` from the preferred index, no
/// stop condition. The winner becomes the new preferred arena.
fn acquire_arena() -> (usize, MutexGuard<'static, ArenaState>) {
    let mut index = PREFERRED_ARENA.with(Cell::get);
    loop {
        if let Some(state) = ARENAS[index].state.try_lock() {
            PREFERRED_ARENA.with(|preferred| preferred.set(index));
            return (index, state);
        }
        index = (index + 1) % NUM_ARENAS;
    }
}

/// Inserts `new` right after the sentinel.
///
/// # Safety
///
/// Caller holds the arena lock; `sentinel` heads an initialized ring and
/// `new` is unlinked.
unsafe fn link_front(sentinel: *mut ChunkHeader, new: *mut ChunkHeader) {
    // SAFETY: all four headers touched are owned by the locked arena.
    unsafe {
        let first = (*sentinel).next;
        (*new).prev = sentinel;
        (*new).next = first;
        (*first).prev = new;
        (*sentinel).next = new;
    }
}

/// Removes `chunk` from its ring.
///
/// # Safety
///
/// Caller holds the arena lock; `chunk` is linked.
unsafe fn unlink(chunk: *mut ChunkHeader) {
    // SAFETY: neighbors are live headers in the same locked arena.
    unsafe {
        let prev = (*chunk).prev;
        let next = (*chunk).next;
        (*prev).next = next;
        (*next).prev = prev;
    }
}

/// Serves a bucketed allocation from `class_id`.
///
/// Walks the class ring of whichever arena was acquired; the first chunk
/// with a free slot wins. An exhausted ring grows by one fresh chunk,
/// linked at the front.
pub(crate) fn allocate_bucketed(class_id: usize) -> *mut u8 {
    ensure_init();
    let (arena_index, mut state) = acquire_arena();
    let sentinel: *mut ChunkHeader = state.rings[class_id].sentinel();

    // SAFETY: ring pointers are valid and exclusively ours under the
    // arena lock; claimed slots are carved before the lock is released.
    unsafe {
        let mut cur = (*sentinel).next;
        loop {
            if cur == sentinel {
                cur = chunk::new_bucketed(class_id, arena_index);
                link_front(sentinel, cur);
            }
            if let Some(slot_index) = (*cur).occupancy.claim_lowest_free() {
                return chunk::carve_slot(cur, slot_index);
            }
            cur = (*cur).next;
        }
    }
}

/// Returns a bucketed slot to its chunk, releasing the chunk to the OS if
/// it became empty.
///
/// # Safety
///
/// `user` must be a live pointer whose back-reference names `chunk`, and
/// `chunk` must be a bucketed chunk of this allocator.
pub(crate) unsafe fn free_bucketed(chunk: *mut ChunkHeader, user: *mut u8) {
    // SAFETY: arena_index is immutable after chunk creation and readable
    // without the lock.
    let arena_index = unsafe { (*chunk).arena_index };
    let _state = ARENAS[arena_index].state.lock();

    // SAFETY: occupancy and ring links are ours under the arena lock. An
    // empty chunk is unreachable once unlinked (no live slots, not in the
    // ring), so unmapping it here cannot race another thread.
    unsafe {
        let class_id = (*chunk).class_id;
        let slot_index = chunk::slot_index_of(chunk, user);
        (*chunk).occupancy.release(slot_index);

        if (*chunk).occupancy == EMPTY_PATTERNS[class_id] {
            unlink(chunk);
            let len = (*chunk).chunk_size;
            page::unmap(chunk.cast(), len);
        }
    }
}
