//! Benchmark support crate; see the `benches/` directory.
