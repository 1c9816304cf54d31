//! Benchmark-only crate; the interesting code lives in `benches/`.
