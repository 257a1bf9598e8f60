//! Large-allocation lifecycle.

use xmalloc_core::chunk::{CHUNK_HEADER_SIZE, SLOT_BACKREF_SIZE, owner_of};
use xmalloc_core::page::round_to_pages;
use xmalloc_core::size_class::LARGE_CLASS;
use xmalloc_core::{allocate, free, reallocate};

#[test]
fn megabyte_block_roundtrip() {
    const SIZE: usize = 1 << 20;

    let p = allocate(SIZE);
    assert!(!p.is_null());
    assert_eq!(p as usize % align_of::<usize>(), 0);

    // SAFETY: p is live for SIZE bytes until the free below.
    unsafe {
        let chunk = owner_of(p);
        assert_eq!((*chunk).class_id, LARGE_CLASS);
        assert_eq!(
            (*chunk).chunk_size,
            round_to_pages(SIZE + CHUNK_HEADER_SIZE + SLOT_BACKREF_SIZE)
        );

        p.write_bytes(0x5C, SIZE);
        assert_eq!(p.read(), 0x5C);
        assert_eq!(p.add(SIZE / 2).read(), 0x5C);
        assert_eq!(p.add(SIZE - 1).read(), 0x5C);

        free(p);
    }

    // The mapping was released; a fresh request must still succeed (the
    // address may or may not be reused).
    let q = allocate(SIZE);
    assert!(!q.is_null());
    // SAFETY: q is live and freed once.
    unsafe { free(q) };
}

#[test]
fn grow_from_bucketed_to_large_preserves_contents() {
    let p = allocate(24);
    // SAFETY: p is consumed by reallocate; q owns the copy afterwards.
    unsafe {
        std::ptr::copy_nonoverlapping(b"hello\0".as_ptr(), p, 6);
        let q = reallocate(p, 1 << 20);
        assert!(!q.is_null());
        assert_eq!((*owner_of(q)).class_id, LARGE_CLASS);
        let mut copied = [0u8; 6];
        std::ptr::copy_nonoverlapping(q, copied.as_mut_ptr(), 6);
        assert_eq!(&copied, b"hello\0");
        free(q);
    }
}

#[test]
fn many_large_blocks_are_independent() {
    let blocks: Vec<(*mut u8, u8)> = (0..8)
        .map(|i| {
            let p = allocate(300_000 + i * 10_000);
            // SAFETY: p is live for the requested size.
            unsafe { p.write_bytes(i as u8, 300_000 + i * 10_000) };
            (p, i as u8)
        })
        .collect();

    for &(p, tag) in &blocks {
        // SAFETY: each block is still live; freed once below.
        unsafe {
            assert_eq!(p.read(), tag);
            free(p);
        }
    }
}
