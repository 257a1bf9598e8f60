//! Benchmark-only crate; see `benches/malloc_bench.rs`.
