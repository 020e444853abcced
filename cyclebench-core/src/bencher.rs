//! Bencher - The Iteration Protocol
//!
//! The handle a benchmark callback receives. It exposes the benchmark's
//! iteration sequence as an explicit state machine: each call to
//! [`Bencher::advance`] closes the previous iteration with a cycle reading,
//! folds it into the running mean and decides whether another iteration
//! should run.
//!
//! ```text
//!   Idle ──advance()──▶ Running ──advance()*──▶ Retired
//!          (anchor)             (count > min)    (result latched)
//! ```
//!
//! The sequence is single-use. Advancing a retired bencher panics instead of
//! silently measuring again.

use crate::accumulator::{BenchResult, SampleAccumulator, Step};
use crate::measure::{CycleSource, HardwareClock};
use std::iter::FusedIterator;

/// Default iteration threshold: a run ends once its count exceeds this.
pub const DEFAULT_MIN_ITERATIONS: u64 = 1000;

enum Phase {
    /// Sequence not consumed yet
    Idle,
    /// Accumulator live, iterations in flight
    Running(SampleAccumulator),
    /// Stopping condition met; final snapshot kept
    Retired(BenchResult),
}

/// Iteration controller handed to every benchmark callback.
///
/// ```ignore
/// fn bm_vec_push(b: &mut Bencher) {
///     let mut v = Vec::new();
///     while b.advance() {
///         v.push(10);
///     }
/// }
/// ```
pub struct Bencher {
    name: String,
    min_iterations: u64,
    source: Box<dyn CycleSource>,
    phase: Phase,
}

impl Bencher {
    /// Create a bencher reading the hardware cycle counter.
    pub fn new(name: impl Into<String>, min_iterations: u64) -> Self {
        Self::with_source(name, min_iterations, HardwareClock)
    }

    /// Create a bencher that samples `source` instead of the hardware counter.
    pub fn with_source<S>(name: impl Into<String>, min_iterations: u64, source: S) -> Self
    where
        S: CycleSource + 'static,
    {
        Self {
            name: name.into(),
            min_iterations,
            source: Box::new(source),
            phase: Phase::Idle,
        }
    }

    /// Step the iteration sequence.
    ///
    /// Returns `true` while the caller should run its critical section once
    /// more, and `false` once the sequence is exhausted.
    ///
    /// The first call anchors the first iteration. Every later call takes a
    /// reading and computes the delta against the iteration start:
    /// - non-positive delta: anomaly counted, same start kept, keep going
    /// - positive delta: iteration counted, mean updated, then either the run
    ///   retires (count above threshold) or the start is re-armed
    ///
    /// # Panics
    ///
    /// Panics when called again after it has returned `false`.
    #[inline]
    pub fn advance(&mut self) -> bool {
        match &mut self.phase {
            Phase::Running(acc) => {
                let reading = self.source.read();
                match acc.record(reading) {
                    Step::Anomaly { delta } => {
                        tracing::trace!(bench = %self.name, delta = %delta, "non-positive cycle delta");
                        true
                    }
                    Step::Accepted { .. } if acc.is_exhausted(self.min_iterations) => {
                        self.retire();
                        false
                    }
                    Step::Accepted { .. } => {
                        acc.rearm(self.source.read());
                        true
                    }
                }
            }
            Phase::Idle => self.start(),
            Phase::Retired(_) => panic!(
                "benchmark `{}` advanced after its iteration sequence ended",
                self.name
            ),
        }
    }

    /// Iterate the sequence with a `for` loop: one item per iteration.
    pub fn iterations(&mut self) -> Iterations<'_> {
        Iterations {
            bencher: self,
            finished: false,
        }
    }

    /// Run `f` once per iteration until the sequence is exhausted.
    #[inline]
    pub fn iter<T, F>(&mut self, mut f: F)
    where
        F: FnMut() -> T,
    {
        while self.advance() {
            std::hint::black_box(f());
        }
    }

    /// Run `routine` once per iteration on a fresh input from `setup`.
    ///
    /// The iteration start is re-armed after `setup` returns, so only
    /// `routine` is measured.
    #[inline]
    pub fn iter_with_setup<T, R, S, F>(&mut self, mut setup: S, mut routine: F)
    where
        S: FnMut() -> T,
        F: FnMut(T) -> R,
    {
        while self.advance() {
            let input = setup();
            self.restart_iteration();
            std::hint::black_box(routine(input));
        }
    }

    /// Re-read the counter as the start of the current iteration.
    ///
    /// Excludes whatever ran since the last [`advance`](Self::advance) from
    /// the measurement. No effect unless the sequence is running.
    #[inline]
    pub fn restart_iteration(&mut self) {
        if let Phase::Running(acc) = &mut self.phase {
            acc.rearm(self.source.read());
        }
    }

    fn start(&mut self) -> bool {
        let reading = self.source.read();
        let acc = SampleAccumulator::create(self.name.clone(), reading);
        tracing::trace!(bench = %self.name, anchor = reading, "iteration sequence started");

        if acc.is_exhausted(self.min_iterations) {
            self.phase = Phase::Retired(acc.finalize());
            return false;
        }
        self.phase = Phase::Running(acc);
        true
    }

    fn retire(&mut self) {
        if let Phase::Running(acc) = std::mem::replace(&mut self.phase, Phase::Idle) {
            let result = acc.finalize();
            tracing::debug!(
                bench = %result.name(),
                iterations = result.iterations(),
                mean_cycles = result.mean_cycles(),
                anomalies = result.negative_samples(),
                "iteration sequence exhausted"
            );
            self.phase = Phase::Retired(result);
        }
    }

    /// Benchmark name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stopping threshold for this run
    pub fn min_iterations(&self) -> u64 {
        self.min_iterations
    }

    /// Iterations begun so far (0 before the sequence starts)
    pub fn iteration_count(&self) -> u64 {
        match &self.phase {
            Phase::Idle => 0,
            Phase::Running(acc) => acc.iteration_count(),
            Phase::Retired(result) => result.iterations(),
        }
    }

    /// Running mean in cycles (0 before the first accepted iteration)
    pub fn running_mean(&self) -> u64 {
        match &self.phase {
            Phase::Idle => 0,
            Phase::Running(acc) => acc.running_mean(),
            Phase::Retired(result) => result.mean_cycles(),
        }
    }

    /// Readings rejected for a non-positive delta
    pub fn negative_sample_count(&self) -> u64 {
        match &self.phase {
            Phase::Idle => 0,
            Phase::Running(acc) => acc.negative_sample_count(),
            Phase::Retired(result) => result.negative_samples(),
        }
    }

    /// Live accumulator, while the sequence is running
    pub fn accumulator(&self) -> Option<&SampleAccumulator> {
        match &self.phase {
            Phase::Running(acc) => Some(acc),
            _ => None,
        }
    }

    /// Whether the stopping condition has fired
    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Retired(_))
    }

    /// Final result, once the sequence is exhausted
    pub fn result(&self) -> Option<&BenchResult> {
        match &self.phase {
            Phase::Retired(result) => Some(result),
            _ => None,
        }
    }

    /// Consume the bencher, returning the result if the sequence completed.
    ///
    /// A run abandoned part-way yields `None`; its partial state is dropped.
    pub fn into_result(self) -> Option<BenchResult> {
        match self.phase {
            Phase::Retired(result) => Some(result),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Bencher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bencher")
            .field("name", &self.name)
            .field("min_iterations", &self.min_iterations)
            .field("iteration_count", &self.iteration_count())
            .field("done", &self.is_done())
            .finish_non_exhaustive()
    }
}

/// `for`-loop view over a [`Bencher`]'s iteration sequence.
///
/// Yields `()` once per iteration and stays exhausted afterwards.
#[derive(Debug)]
pub struct Iterations<'a> {
    bencher: &'a mut Bencher,
    finished: bool,
}

impl Iterator for Iterations<'_> {
    type Item = ();

    #[inline]
    fn next(&mut self) -> Option<()> {
        if self.finished {
            return None;
        }
        if self.bencher.advance() {
            Some(())
        } else {
            self.finished = true;
            None
        }
    }
}

impl FusedIterator for Iterations<'_> {}
