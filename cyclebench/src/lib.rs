#![warn(missing_docs)]
//! # CycleBench
//!
//! A small micro-benchmark harness that measures code in reference cycles.
//!
//! - **Serialized cycle counter**: `LFENCE; RDTSC; LFENCE` on x86_64, `ISB; CNTVCT_EL0` on AArch64
//! - **O(1) memory**: an integer running mean instead of a sample buffer
//! - **Explicit iteration protocol**: `while b.advance() { ... }` with a single-use sequence
//! - **Anomaly counting**: non-positive cycle deltas are counted, never averaged
//! - **System advisories**: warns about turbo boost, frequency governors and ASLR
//! - **Forgiving CLI**: a bad `--name=value` flag is reported, never fatal
//!
//! ## Quick Start
//!
//! ```ignore
//! use cyclebench::prelude::*;
//!
//! fn bm_vec_push(b: &mut Bencher) {
//!     let mut v = Vec::new();
//!     while b.advance() {
//!         v.push(10);
//!     }
//! }
//! register_bench!(bm_vec_push);
//!
//! cyclebench::main!();
//! ```
//!
//! ## Explicit registry
//!
//! ```ignore
//! let mut registry = cyclebench::Registry::new();
//! registry.register("bm_sum", |b: &mut cyclebench::Bencher| b.iter(|| (0..64u64).sum::<u64>()));
//! cyclebench::run_with_args(registry, std::env::args())?;
//! ```

// Re-export core types
pub use cyclebench_core::{
    BenchResult, Bencher, BenchmarkDef, CycleSource, DEFAULT_MIN_ITERATIONS, HAS_CYCLE_COUNTER,
    HardwareClock, Iterations, Registry, RegistryError, Results, SampleAccumulator, read_cycles,
    wall_clock_millis,
};

// Re-export report types
pub use cyclebench_report::{OutputFormat, Report, ReportDestination, format_text};

// Re-export the harness
pub use cyclebench_cli::{CycleConfig, FlagError, Options, RunSummary, run_with_args, run_with_config};

/// Internal re-exports for macro use
#[doc(hidden)]
pub mod internal {
    pub use cyclebench_core::StaticBenchmark;
    pub use cyclebench_core::inventory;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Bencher, Registry, register_bench};
}

/// Run the CycleBench harness over every `register_bench!` benchmark.
///
/// Call this from your benchmark binary's `main()`:
/// ```ignore
/// fn main() {
///     cyclebench::run().unwrap();
/// }
/// ```
pub use cyclebench_cli::run;

/// Submit a benchmark function for discovery by [`run`].
///
/// The benchmark is named after the function unless a name is given.
///
/// ```ignore
/// fn bm_noop(b: &mut Bencher) { while b.advance() {} }
/// register_bench!(bm_noop);
/// register_bench!(bm_noop, "bm_noop_again");
/// ```
#[macro_export]
macro_rules! register_bench {
    ($func:path) => {
        $crate::register_bench!($func, stringify!($func));
    };
    ($func:path, $name:expr) => {
        $crate::internal::inventory::submit! {
            $crate::internal::StaticBenchmark {
                name: $name,
                runner_fn: ::core::option::Option::Some($func as fn(&mut $crate::Bencher)),
            }
        }
    };
}

/// Generate a `main` that runs every registered benchmark.
///
/// The process exits with status 0 even when a benchmark fails; failures are
/// reported on the console instead.
#[macro_export]
macro_rules! main {
    () => {
        fn main() {
            if let Err(e) = $crate::run() {
                eprintln!("cyclebench: {e:#}");
            }
        }
    };
}
