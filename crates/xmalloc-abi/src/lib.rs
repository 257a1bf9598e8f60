//! # xmalloc-abi
//!
//! `extern "C"` boundary for the allocator: the three classic entry
//! points, exported as `xmalloc`, `xfree`, and `xrealloc` so C drivers
//! and benchmark harnesses can link directly against them. The `x`
//! prefix keeps the symbols from shadowing the host allocator inside
//! binaries that still use it (test runners included).
//!
//! Semantics match the corresponding standard-library contracts, with
//! the allocator's restrictions: fundamental alignment only, fatal on
//! OS mapping failure, misuse undefined.

use std::ffi::c_void;

/// C `xmalloc` — allocates `size` bytes of uninitialized memory.
///
/// Never returns null; a refused OS mapping terminates the process.
///
/// # Safety
///
/// Caller must eventually `xfree` the returned pointer exactly once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn xmalloc(size: usize) -> *mut c_void {
    xmalloc_core::allocate(size).cast()
}

/// C `xfree` — deallocates memory previously returned by `xmalloc` or
/// `xrealloc`. If `ptr` is null, no operation is performed.
///
/// # Safety
///
/// `ptr` must be null or a pointer returned by `xmalloc`/`xrealloc` that
/// has not been freed already.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn xfree(ptr: *mut c_void) {
    // SAFETY: contract forwarded from the C caller.
    unsafe { xmalloc_core::free(ptr.cast()) }
}

/// C `xrealloc` — resizes a previously allocated block.
///
/// - If `ptr` is null, behaves like `xmalloc(size)`.
/// - If `size` is 0 and `ptr` is non-null, behaves like `xfree(ptr)` and
///   returns null.
/// - Otherwise the contents are preserved up to the minimum of the old
///   capacity and `size`; the returned pointer may differ and `ptr`
///   becomes invalid.
///
/// # Safety
///
/// `ptr` must be null or a pointer returned by `xmalloc`/`xrealloc` that
/// has not been freed already.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn xrealloc(ptr: *mut c_void, size: usize) -> *mut c_void {
    // SAFETY: contract forwarded from the C caller.
    unsafe { xmalloc_core::reallocate(ptr.cast(), size).cast() }
}
