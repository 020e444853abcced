#![warn(missing_docs)]
//! CycleBench Core - Measurement Runtime
//!
//! This crate holds everything that touches a measurement:
//! - Serialized cycle-counter reads and a millisecond wall clock
//! - `SampleAccumulator`, the O(1)-memory running-mean state of one run
//! - `Bencher`, the iteration protocol handed to benchmark callbacks
//! - `Registry`, the ordered list of benchmarks to drive

mod accumulator;
mod bencher;
mod measure;
mod registry;

pub use accumulator::{BenchResult, Results, SampleAccumulator, Step, incremental_mean};
pub use bencher::{Bencher, DEFAULT_MIN_ITERATIONS, Iterations};
/// Whether this platform provides a hardware cycle counter (x86_64 TSC or AArch64 CNTVCT_EL0).
/// When `false`, readings are monotonic nanoseconds instead.
pub use measure::HAS_CYCLE_COUNTER;
pub use measure::{CycleSource, HardwareClock, pin_to_cpu, read_cycles, wall_clock_millis};
pub use registry::{BenchFn, BenchmarkDef, Registry, RegistryError, StaticBenchmark};

// Re-exported for the registration macro in the facade crate.
#[doc(hidden)]
pub use inventory;

/// Anchor to prevent LTO from stripping inventory entries
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || {
    for _ in inventory::iter::<StaticBenchmark> {}
};
