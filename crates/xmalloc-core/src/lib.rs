//! # xmalloc-core
//!
//! A general-purpose dynamic memory allocator: [`allocate`], [`free`],
//! [`reallocate`]. Backing memory comes straight from the kernel in
//! page-sized anonymous mappings; no host allocator is involved, for
//! either user memory or the allocator's own bookkeeping.
//!
//! # Architecture
//!
//! ```text
//! allocate/free/reallocate (alloc)
//!         │
//!         ├── size-class engine: arenas → chunk rings → slots
//!         │       (size_class, occupancy, chunk, arena)
//!         ├── large-allocation path (large)
//!         └── OS mapping layer (page → syscall)
//! ```
//!
//! Requests small enough for a size class are served from per-class
//! chunks, each sliced into equal slots tracked by a 256-bit occupancy
//! map; a slot's back-reference word makes free O(1). State is sharded
//! across four mutex-guarded arenas; threads stick to an arena until
//! contention pushes them off. Oversized requests get a dedicated
//! mapping released on free.

pub mod alloc;
mod arena;
pub mod chunk;
mod large;
pub mod occupancy;
pub mod page;
pub mod size_class;
#[cfg(target_arch = "x86_64")]
pub mod syscall;

pub use alloc::{allocate, free, reallocate};
pub use arena::NUM_ARENAS;
