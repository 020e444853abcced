//! Benchmark Execution
//!
//! Drives every registered benchmark to completion, one at a time and in
//! registration order:
//!
//! ```text
//! Registry ──▶ fresh Bencher ──▶ callback (under catch_unwind)
//!                                     │
//!                 ┌───────────────────┼────────────────────┐
//!                 ▼                   ▼                    ▼
//!            sequence done      returned early           panicked
//!           (BenchResult)    (Incomplete, dropped)  (Panicked, dropped)
//! ```
//!
//! Only completed runs reach the results collection.

use cyclebench_core::{
    BenchResult, Bencher, BenchmarkDef, DEFAULT_MIN_ITERATIONS, Registry, Results, pin_to_cpu,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Configuration for benchmark execution
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// A run ends once its iteration count exceeds this
    pub min_iterations: u64,
    /// Core to pin the thread to before running
    pub pin_cpu: Option<usize>,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            min_iterations: DEFAULT_MIN_ITERATIONS,
            pin_cpu: None,
            show_progress: true,
        }
    }
}

/// Why a benchmark produced no result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The callback panicked
    Panicked(String),
    /// The callback returned before its sequence was exhausted
    Incomplete {
        /// Iterations begun when it returned
        iterations: u64,
    },
}

/// A benchmark that produced no result
#[derive(Debug, Clone)]
pub struct BenchFailure {
    /// Benchmark name
    pub name: String,
    /// What went wrong
    pub kind: FailureKind,
}

impl std::fmt::Display for BenchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            FailureKind::Panicked(message) => {
                write!(f, "Benchmark {} panicked: {message}", self.name)
            }
            FailureKind::Incomplete { iterations } => write!(
                f,
                "Benchmark {} did not complete its iteration sequence ({iterations} iterations begun)",
                self.name
            ),
        }
    }
}

/// Outcome of one pass over the registry
#[derive(Debug, Default)]
pub struct ExecutionOutcome {
    /// Completed runs, in completion order
    pub results: Results,
    /// Runs that produced nothing
    pub failures: Vec<BenchFailure>,
    /// Wall time of the whole pass
    pub duration: Duration,
}

/// Runs benchmarks in-process
pub struct Executor {
    config: ExecutionConfig,
}

impl Executor {
    /// Create an executor
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    /// Execute every benchmark in `registry`
    pub fn execute(&mut self, registry: &mut Registry) -> ExecutionOutcome {
        let start = Instant::now();
        if let Some(cpu) = self.config.pin_cpu {
            match pin_to_cpu(cpu) {
                Ok(()) => tracing::debug!(cpu, "pinned benchmark thread"),
                Err(e) => tracing::warn!(cpu, "could not pin benchmark thread: {e}"),
            }
        }

        let pb = if self.config.show_progress {
            ProgressBar::new(registry.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut outcome = ExecutionOutcome::default();
        for bench in registry.iter_mut() {
            pb.set_message(bench.name().to_string());
            match self.execute_single(bench) {
                Ok(result) => outcome.results.push(result),
                Err(failure) => {
                    tracing::warn!(bench = %failure.name, "{failure}");
                    outcome.failures.push(failure);
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        outcome.duration = start.elapsed();
        tracing::debug!(
            completed = outcome.results.len(),
            failed = outcome.failures.len(),
            elapsed_ms = outcome.duration.as_millis() as u64,
            "execution finished"
        );
        outcome
    }

    /// Execute a single benchmark
    fn execute_single(&self, bench: &mut BenchmarkDef) -> Result<BenchResult, BenchFailure> {
        tracing::debug!(bench = %bench.name(), min_iterations = self.config.min_iterations, "starting benchmark");
        let mut bencher = Bencher::new(bench.name(), self.config.min_iterations);

        let run = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| bench.run(&mut bencher)));

        if let Err(panic) = run {
            let message = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            return Err(BenchFailure {
                name: bench.name().to_string(),
                kind: FailureKind::Panicked(message),
            });
        }

        let iterations = bencher.iteration_count();
        match bencher.into_result() {
            Some(result) => {
                tracing::debug!(
                    bench = %result.name(),
                    mean_cycles = result.mean_cycles(),
                    iterations = result.iterations(),
                    "benchmark complete"
                );
                Ok(result)
            }
            None => Err(BenchFailure {
                name: bench.name().to_string(),
                kind: FailureKind::Incomplete { iterations },
            }),
        }
    }
}
