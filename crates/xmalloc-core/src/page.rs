//! OS mapping layer.
//!
//! Every byte of usable memory in the allocator originates here: anonymous,
//! private, read/write, page-aligned regions obtained from the kernel and
//! returned to it. The layer also owns the fatal path for a refused
//! mapping — there is no graceful recovery from out-of-memory in this
//! allocator, so the refusal is reported on stderr and the process is
//! terminated.

use core::fmt::{self, Write as _};
use core::ptr::NonNull;

use thiserror::Error;

use crate::syscall::{sys_exit_group, sys_mmap, sys_munmap, sys_write};

/// System page size. The allocator assumes 4 KiB pages.
pub const PAGE_SIZE: usize = 4096;

// Protection and mapping flags, Linux values.
pub const PROT_READ: i32 = 0x1;
pub const PROT_WRITE: i32 = 0x2;
pub const MAP_PRIVATE: i32 = 0x02;
pub const MAP_ANONYMOUS: i32 = 0x20;

/// errno used when a request overflows size arithmetic before it ever
/// reaches the kernel. The kernel would refuse such a mapping with the
/// same value.
pub(crate) const ENOMEM: i32 = 12;

/// A mapping request the kernel refused.
#[derive(Debug, Error)]
#[error("anonymous mapping of {len} bytes refused by the kernel (errno {errno})")]
pub struct MapError {
    /// Length of the refused request in bytes.
    pub len: usize,
    /// errno reported by the kernel.
    pub errno: i32,
}

/// Rounds `bytes` up to a whole number of pages.
///
/// Saturates near `usize::MAX`; the kernel refuses any mapping that close
/// to the address-space limit.
pub const fn round_to_pages(bytes: usize) -> usize {
    bytes.saturating_add(PAGE_SIZE - 1) & !(PAGE_SIZE - 1)
}

/// Obtains a private, anonymous, read/write region of exactly `len` bytes.
///
/// `len` must be a positive multiple of [`PAGE_SIZE`]. The region is
/// page-aligned and zero-filled by the kernel.
pub fn map(len: usize) -> Result<NonNull<u8>, MapError> {
    debug_assert!(len > 0 && len % PAGE_SIZE == 0);

    // SAFETY: anonymous mapping with no fd; the kernel picks the address.
    let ret = unsafe {
        sys_mmap(
            core::ptr::null_mut(),
            len,
            PROT_READ | PROT_WRITE,
            MAP_PRIVATE | MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    match ret {
        // The kernel never places an anonymous mapping at address zero.
        Ok(addr) => NonNull::new(addr).ok_or(MapError { len, errno: ENOMEM }),
        Err(errno) => Err(MapError { len, errno }),
    }
}

/// Releases a region previously obtained from [`map`].
///
/// # Safety
///
/// `addr` must be the address returned by `map` and `len` the length used
/// at map time; no pointer into the region may be used afterwards.
pub unsafe fn unmap(addr: *mut u8, len: usize) {
    // SAFETY: caller passes the address and length of a live mapping.
    let ret = unsafe { sys_munmap(addr, len) };
    debug_assert!(ret.is_ok(), "munmap of an owned mapping cannot fail");
    let _ = ret;
}

/// Fixed-capacity diagnostic buffer for the abort path.
///
/// The abort path runs when the kernel is already refusing memory, so the
/// message is formatted into stack space and written with a raw syscall.
struct DiagBuf {
    buf: [u8; 160],
    len: usize,
}

impl fmt::Write for DiagBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.buf.len() - self.len;
        let take = s.len().min(room);
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

/// Reports a refused mapping on stderr and terminates the process.
///
/// Every caller of the allocator assumes allocation succeeds; propagating
/// the failure upward through every call site is not supported.
pub fn oom_abort(err: &MapError) -> ! {
    let mut out = DiagBuf {
        buf: [0; 160],
        len: 0,
    };
    let _ = writeln!(out, "xmalloc: {err}");
    // SAFETY: out.buf[..out.len] is initialized message text.
    unsafe {
        let _ = sys_write(2, out.buf.as_ptr(), out.len);
    }
    sys_exit_group(1)
}
