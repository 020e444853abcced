//! Report Model and Text Rendering

use crate::OutputFormat;
use cyclebench_core::{BenchResult, Results};
use std::fmt::Write as _;

/// Everything the reporter needs from one run of the harness.
#[derive(Debug, Clone)]
pub struct Report {
    /// Name of the benchmark binary
    pub binary: String,
    /// Requested output format
    pub format: OutputFormat,
    /// Finalized results, in completion order
    pub results: Vec<BenchResult>,
}

impl Report {
    /// Build a report from the driver's results collection.
    pub fn new(binary: impl Into<String>, format: OutputFormat, results: Results) -> Self {
        Self {
            binary: binary.into(),
            format,
            results: results.into_vec(),
        }
    }

    /// Number of completed benchmarks
    pub fn completed(&self) -> usize {
        self.results.len()
    }

    /// Total rejected readings across all benchmarks
    pub fn total_anomalies(&self) -> u64 {
        self.results.iter().map(BenchResult::negative_samples).sum()
    }
}

/// Render a report as text.
///
/// ```text
/// Running benchmarks in ./bm_demo. Format: Text.
/// Name : bm_vec_push
/// CPU Time : 31 reference cycles
/// Wall Time : 0 milliseconds
/// Iterations : 1001
/// Anomalies : 0
/// 1 benchmark(s) completed in ./bm_demo (format: Text)
/// ```
pub fn format_text(report: &Report) -> String {
    let mut output = String::new();
    let delim = report.format.delimiter();

    let _ = write!(output, "Running benchmarks in {}. ", report.binary);
    if report.format != OutputFormat::Unknown {
        let _ = write!(output, "Format: {}. ", report.format);
    }
    output.push('\n');

    for result in &report.results {
        let _ = writeln!(output, "Name{delim}{}", result.name());
        let _ = writeln!(output, "CPU Time{delim}{} reference cycles", result.mean_cycles());
        let _ = writeln!(output, "Wall Time{delim}{} milliseconds", result.wall_time_ms());
        let _ = writeln!(output, "Iterations{delim}{}", result.iterations());
        let _ = writeln!(output, "Anomalies{delim}{}", result.negative_samples());
    }

    let _ = writeln!(
        output,
        "{} benchmark(s) completed in {} (format: {})",
        report.completed(),
        report.binary,
        report.format
    );
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclebench_core::SampleAccumulator;

    fn sample_results() -> Results {
        let mut acc = SampleAccumulator::create("bm_vec_push", 0);
        acc.record(40);
        acc.rearm(50);
        acc.record(50);

        let mut results = Results::new();
        results.push(acc.finalize());
        results
    }

    #[test]
    fn test_text_format_layout() {
        let report = Report::new("./bm_demo", OutputFormat::Text, sample_results());
        let text = format_text(&report);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "Running benchmarks in ./bm_demo. Format: Text. ");
        assert_eq!(lines[1], "Name : bm_vec_push");
        assert_eq!(lines[2], "CPU Time : 20 reference cycles");
        assert!(lines[3].starts_with("Wall Time : "));
        assert!(lines[3].ends_with(" milliseconds"));
        assert_eq!(lines[4], "Iterations : 2");
        assert_eq!(lines[5], "Anomalies : 1");
        assert_eq!(lines[6], "1 benchmark(s) completed in ./bm_demo (format: Text)");
    }

    #[test]
    fn test_unknown_format_uses_space() {
        let report = Report::new("bm", OutputFormat::Unknown, sample_results());
        let text = format_text(&report);

        assert!(text.starts_with("Running benchmarks in bm. \n"));
        assert!(!text.contains("Format:"));
        assert!(text.contains("\nCPU Time 20 reference cycles\n"));
        assert!(text.ends_with("(format: Unknown)\n"));
    }

    #[test]
    fn test_empty_report() {
        let report = Report::new("bm", OutputFormat::Text, Results::new());
        assert_eq!(report.completed(), 0);
        assert_eq!(
            format_text(&report),
            "Running benchmarks in bm. Format: Text. \n0 benchmark(s) completed in bm (format: Text)\n"
        );
    }

    #[test]
    fn test_total_anomalies() {
        let mut results = sample_results();
        results.push(SampleAccumulator::create("other", 0).finalize());
        let report = Report::new("bm", OutputFormat::Text, results);
        assert_eq!(report.total_anomalies(), 1);
    }
}
