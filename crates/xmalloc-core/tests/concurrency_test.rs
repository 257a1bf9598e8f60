//! Multi-threaded allocate/free pressure.

use std::thread;

use xmalloc_core::{allocate, free, reallocate};

#[derive(Clone, Copy)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

const SIZES: [usize; 6] = [16, 24, 40, 64, 500, 1000];

#[test]
fn eight_threads_of_alloc_free_cycles() {
    const THREADS: u64 = 8;
    const CYCLES: usize = 100_000;

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            thread::spawn(move || {
                let mut rng = XorShift64::new(t + 1);
                for cycle in 0..CYCLES {
                    let size = SIZES[(rng.next_u64() % SIZES.len() as u64) as usize];
                    let p = allocate(size);
                    assert!(!p.is_null(), "thread {t} cycle {cycle}: null allocate");
                    // SAFETY: p is live for size bytes and freed once per
                    // cycle; the tag byte catches cross-thread slot sharing.
                    unsafe {
                        p.write_bytes(t as u8 ^ 0xAA, size);
                        assert_eq!(p.read(), t as u8 ^ 0xAA);
                        assert_eq!(p.add(size - 1).read(), t as u8 ^ 0xAA);
                        free(p);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }
}

#[test]
fn threads_free_blocks_allocated_elsewhere() {
    // Freeing must return a slot to the arena that owns its chunk even
    // when a different thread performs the free.
    const THREADS: usize = 4;
    const BLOCKS: usize = 5_000;

    let allocators: Vec<_> = (0..THREADS)
        .map(|t| {
            thread::spawn(move || {
                let mut rng = XorShift64::new((t as u64 + 1) << 16);
                (0..BLOCKS)
                    .map(|_| {
                        let size = SIZES[(rng.next_u64() % SIZES.len() as u64) as usize];
                        let p = allocate(size);
                        // SAFETY: p is live for size bytes.
                        unsafe { p.write_bytes(0x3C, size) };
                        p as usize
                    })
                    .collect::<Vec<usize>>()
            })
        })
        .collect();
    let batches: Vec<Vec<usize>> = allocators
        .into_iter()
        .map(|handle| handle.join().expect("allocator thread panicked"))
        .collect();

    // Rotate ownership: each thread frees the previous thread's batch.
    let freers: Vec<_> = batches
        .into_iter()
        .map(|batch| {
            thread::spawn(move || {
                for addr in batch {
                    // SAFETY: each address is a live allocation handed over
                    // by the thread that made it; freed once.
                    unsafe { free(addr as *mut u8) };
                }
            })
        })
        .collect();
    for handle in freers {
        handle.join().expect("freeing thread panicked");
    }
}

#[test]
fn concurrent_reallocate_chains() {
    const THREADS: u64 = 8;
    const STEPS: usize = 20_000;

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            thread::spawn(move || {
                let mut rng = XorShift64::new((t + 1) * 7919);
                let mut p = allocate(16);
                let mut size = 16;
                // SAFETY: p always holds the latest live pointer of this
                // thread's chain; the prefix check rides through each move.
                unsafe {
                    p.write_bytes(0xD1, size);
                    for step in 0..STEPS {
                        let next = SIZES[(rng.next_u64() % SIZES.len() as u64) as usize];
                        p = reallocate(p, next);
                        assert!(!p.is_null(), "thread {t} step {step}: null reallocate");
                        let kept = size.min(next);
                        for i in 0..kept {
                            assert_eq!(p.add(i).read(), 0xD1);
                        }
                        p.write_bytes(0xD1, next);
                        size = next;
                    }
                    free(p);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }
}
