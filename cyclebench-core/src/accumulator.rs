//! Sample Accumulator
//!
//! Per-benchmark measurement state. Keeps a running integer mean of
//! per-iteration cycle deltas instead of a sample list, so memory stays
//! constant no matter how many iterations a benchmark runs.

use crate::measure::wall_clock_millis;

/// Outcome of feeding one cycle reading to an accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Positive delta: the iteration was counted and folded into the mean.
    Accepted {
        /// Cycles elapsed since the iteration started
        delta: u64,
    },
    /// Zero or negative delta: counted as an anomaly, state otherwise untouched.
    Anomaly {
        /// Signed difference between the reading and the iteration start
        delta: i128,
    },
}

/// Incremental mean update: `mean + (sample - mean) / n`, truncating toward zero.
#[inline]
pub fn incremental_mean(mean: u64, sample: u64, n: u64) -> u64 {
    debug_assert!(n > 0);
    let diff = i128::from(sample) - i128::from(mean);
    let updated = i128::from(mean) + diff / i128::from(n);
    // mean + (s - mean) / n always lies between s and mean
    updated as u64
}

/// Mutable state of one in-progress measurement run.
///
/// The accumulator is created together with the first cycle reading, which
/// anchors the first iteration. From then on `iteration_count >= 1`.
#[derive(Debug)]
pub struct SampleAccumulator {
    name: String,
    cycle_start: u64,
    iteration_count: u64,
    running_mean: u64,
    negative_sample_count: u64,
    wall_start_ms: i64,
}

impl SampleAccumulator {
    /// Start a run: stamps the wall clock and stores the anchor reading.
    pub fn create(name: impl Into<String>, first_reading: u64) -> Self {
        Self {
            name: name.into(),
            cycle_start: first_reading,
            iteration_count: 1,
            running_mean: 0,
            negative_sample_count: 0,
            wall_start_ms: wall_clock_millis(),
        }
    }

    /// Close the current iteration with `reading`.
    ///
    /// A non-positive delta only bumps the anomaly counter; `cycle_start` keeps
    /// its value so the next reading is compared against the same start.
    pub fn record(&mut self, reading: u64) -> Step {
        let delta = i128::from(reading) - i128::from(self.cycle_start);
        if delta <= 0 {
            self.negative_sample_count += 1;
            return Step::Anomaly { delta };
        }

        // Both operands are u64, so a positive difference fits.
        let delta = delta as u64;
        self.iteration_count += 1;
        self.running_mean = incremental_mean(self.running_mean, delta, self.iteration_count);
        Step::Accepted { delta }
    }

    /// Start the next iteration at `reading`.
    #[inline]
    pub fn rearm(&mut self, reading: u64) {
        self.cycle_start = reading;
    }

    /// True once the iteration count has passed `min_iterations`.
    #[inline]
    pub fn is_exhausted(&self, min_iterations: u64) -> bool {
        self.iteration_count > min_iterations
    }

    /// Benchmark name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reading taken at the start of the current iteration
    pub fn cycle_start(&self) -> u64 {
        self.cycle_start
    }

    /// Iterations begun so far, including the anchor
    pub fn iteration_count(&self) -> u64 {
        self.iteration_count
    }

    /// Running mean of accepted deltas, in cycles
    pub fn running_mean(&self) -> u64 {
        self.running_mean
    }

    /// Readings rejected because their delta was not positive
    pub fn negative_sample_count(&self) -> u64 {
        self.negative_sample_count
    }

    /// Wall-clock start of the run, in Unix milliseconds
    pub fn wall_start_ms(&self) -> i64 {
        self.wall_start_ms
    }

    /// Retire the accumulator and snapshot it into an immutable result.
    ///
    /// Consumes `self`, so a run can be finalized at most once.
    pub fn finalize(self) -> BenchResult {
        let wall_end_ms = wall_clock_millis().max(self.wall_start_ms);
        BenchResult {
            name: self.name,
            mean_cycles: self.running_mean,
            iterations: self.iteration_count,
            negative_samples: self.negative_sample_count,
            wall_start_ms: self.wall_start_ms,
            wall_end_ms,
        }
    }
}

/// Finalized summary of one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchResult {
    name: String,
    mean_cycles: u64,
    iterations: u64,
    negative_samples: u64,
    wall_start_ms: i64,
    wall_end_ms: i64,
}

impl BenchResult {
    /// Benchmark name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mean reference cycles per iteration
    pub fn mean_cycles(&self) -> u64 {
        self.mean_cycles
    }

    /// Iteration count at retirement
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Number of rejected (non-positive) readings
    pub fn negative_samples(&self) -> u64 {
        self.negative_samples
    }

    /// Wall-clock start, Unix milliseconds
    pub fn wall_start_ms(&self) -> i64 {
        self.wall_start_ms
    }

    /// Wall-clock end, Unix milliseconds
    pub fn wall_end_ms(&self) -> i64 {
        self.wall_end_ms
    }

    /// Wall-clock span of the run in milliseconds
    pub fn wall_time_ms(&self) -> i64 {
        self.wall_end_ms - self.wall_start_ms
    }
}

/// Append-only collection of finalized results, in completion order.
#[derive(Debug, Default, Clone)]
pub struct Results {
    entries: Vec<BenchResult>,
}

impl Results {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized result
    pub fn push(&mut self, result: BenchResult) {
        self.entries.push(result);
    }

    /// Number of results
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no benchmark has completed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in completion order
    pub fn iter(&self) -> std::slice::Iter<'_, BenchResult> {
        self.entries.iter()
    }

    /// Borrow as a slice
    pub fn as_slice(&self) -> &[BenchResult] {
        &self.entries
    }

    /// Take the underlying vector
    pub fn into_vec(self) -> Vec<BenchResult> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Results {
    type Item = &'a BenchResult;
    type IntoIter = std::slice::Iter<'a, BenchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
