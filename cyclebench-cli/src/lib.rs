#![warn(missing_docs)]
//! CycleBench CLI Library
//!
//! Everything around the measurement core that a benchmark binary needs:
//! flag parsing, `cyclebench.toml` discovery, system-tuning advisories, the
//! driver that runs each registered benchmark, and report output.
//! Use `cyclebench::main!()` (or `cyclebench_cli::run()`) in your binary.
//!
//! # Example
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

mod advisories;
mod config;
mod executor;
mod flags;

pub use advisories::{Advisory, SYSFS_CHECKS, SystemCheck, probe_path, scan};
pub use config::*;
pub use executor::{BenchFailure, ExecutionConfig, ExecutionOutcome, Executor, FailureKind};
pub use flags::{FlagError, Options};

use cyclebench_core::{Registry, RegistryError};
use cyclebench_report::{OutputFormat, Report, ReportDestination, format_text, write_report_to};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Everything that happened during one invocation.
#[derive(Debug)]
pub struct RunSummary {
    /// Options after flag parsing
    pub options: Options,
    /// Flags that were rejected
    pub flag_errors: Vec<FlagError>,
    /// Advisories printed before running
    pub advisories: Vec<Advisory>,
    /// Report that was rendered
    pub report: Report,
    /// Benchmarks that produced no result
    pub failures: Vec<BenchFailure>,
    /// Where the report went
    pub destination: ReportDestination,
    /// Time spent executing benchmarks
    pub elapsed: Duration,
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` overrides the default `cyclebench=info`. Calling this more than
/// once is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cyclebench=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Run every benchmark submitted with `register_bench!`, using the process arguments.
/// This is the main entry point for benchmark binaries.
pub fn run() -> anyhow::Result<RunSummary> {
    init_logging();
    let (registry, rejected) = Registry::discover();
    report_registration_errors(&rejected, &mut io::stdout().lock())?;
    run_with_args(registry, std::env::args())
}

/// Run `registry` with explicit arguments (`args[0]` is the binary name).
///
/// Discovers `cyclebench.toml` and writes to standard output.
pub fn run_with_args<I, S>(registry: Registry, args: I) -> anyhow::Result<RunSummary>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    init_logging();
    let stdout = io::stdout();
    let mut console = stdout.lock();

    let config = match CycleConfig::discover() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("ignoring configuration: {e}");
            writeln!(console, "Warning: ignoring configuration: {e}")?;
            CycleConfig::default()
        }
    };

    let summary = run_with_config(registry, args, &config, &mut console)?;
    console.flush()?;
    Ok(summary)
}

/// Run `registry` with explicit arguments, configuration and console stream.
///
/// Flags, advisories, failure notices and the report all go to `console`.
/// Only an error writing to `console` is returned.
pub fn run_with_config<I, S, W>(
    mut registry: Registry,
    args: I,
    config: &CycleConfig,
    console: &mut W,
) -> anyhow::Result<RunSummary>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    W: Write,
{
    // Flags
    let (options, flag_errors) = Options::parse(args);
    for err in &flag_errors {
        writeln!(console, "{err}")?;
    }
    if let Some(dir) = &options.test_root_dir {
        writeln!(console, "TEST FLAG SET: --test_root_dir={}", dir.display())?;
    }

    // Flags override cyclebench.toml
    let format = resolve_format(&options, config);
    let output_file = options.output_file.clone().or_else(|| {
        (!config.output.file.is_empty()).then(|| PathBuf::from(&config.output.file))
    });
    let exec_config = ExecutionConfig {
        min_iterations: options.min_iterations.unwrap_or(config.runner.min_iterations),
        pin_cpu: config.runner.pin_cpu,
        show_progress: config.runner.progress,
    };

    // System checks
    let advisories = if config.advisories.enabled || options.any_test_flag_set {
        scan(
            SYSFS_CHECKS,
            options.test_root_dir.as_deref(),
            options.any_test_flag_set,
            console,
        )?
    } else {
        Vec::new()
    };

    tracing::info!(
        benchmarks = registry.len(),
        min_iterations = exec_config.min_iterations,
        format = %format,
        "running benchmarks"
    );

    let mut executor = Executor::new(exec_config);
    let outcome = executor.execute(&mut registry);
    for failure in &outcome.failures {
        writeln!(console, "{failure}")?;
    }

    let report = Report::new(options.binary_name.clone(), format, outcome.results);
    tracing::info!(
        completed = report.completed(),
        failed = outcome.failures.len(),
        anomalies = report.total_anomalies(),
        elapsed_ms = outcome.duration.as_millis() as u64,
        "report ready"
    );
    let text = format_text(&report);
    let destination = write_report_to(&text, output_file.as_deref(), console)?;

    Ok(RunSummary {
        options,
        flag_errors,
        advisories,
        report,
        failures: outcome.failures,
        destination,
        elapsed: outcome.duration,
    })
}

/// Print one line per rejected registration.
pub fn report_registration_errors<W: Write>(errors: &[RegistryError], console: &mut W) -> io::Result<()> {
    for err in errors {
        writeln!(console, "{err}")?;
    }
    Ok(())
}

/// Output format a run would use for the given flags and configuration
pub fn resolve_format(options: &Options, config: &CycleConfig) -> OutputFormat {
    options
        .output_format
        .unwrap_or_else(|| config.output.format.parse().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyclebench_core::Bencher;
    use tempfile::TempDir;

    fn quiet_config() -> CycleConfig {
        let mut config = CycleConfig::default();
        config.runner.min_iterations = 10;
        config.runner.progress = false;
        config.advisories.enabled = false;
        config
    }

    fn spin_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register("bm_spin", |b: &mut Bencher| while b.advance() {});
        registry
    }

    fn run_captured(args: &[&str], config: &CycleConfig) -> (RunSummary, String) {
        let mut console = Vec::new();
        let summary = run_with_config(
            spin_registry(),
            std::iter::once("./bm").chain(args.iter().copied()),
            config,
            &mut console,
        )
        .unwrap();
        (summary, String::from_utf8(console).unwrap())
    }

    #[test]
    fn test_default_run_prints_report() {
        let (summary, console) = run_captured(&[], &quiet_config());
        assert_eq!(summary.destination, ReportDestination::Stdout);
        assert_eq!(summary.report.completed(), 1);
        assert!(console.starts_with("Running benchmarks in ./bm. \n"));
        assert!(console.contains("Iterations 11\n"));
        assert!(console.ends_with("1 benchmark(s) completed in ./bm (format: Unknown)\n"));
    }

    #[test]
    fn test_summary_records_execution_time() {
        let mut registry = Registry::new();
        registry.register("bm_sleepy", |b: &mut Bencher| {
            std::thread::sleep(Duration::from_millis(20));
            while b.advance() {}
        });

        let mut console = Vec::new();
        let summary = run_with_config(registry, ["./bm"], &quiet_config(), &mut console).unwrap();
        assert!(summary.elapsed >= Duration::from_millis(20));
        assert_eq!(
            summary.report.total_anomalies(),
            summary.report.results[0].negative_samples()
        );
    }

    #[test]
    fn test_malformed_flag_does_not_abort() {
        let (summary, console) = run_captured(&["--output_format"], &quiet_config());
        assert_eq!(summary.flag_errors.len(), 1);
        assert_eq!(summary.report.format, OutputFormat::Unknown);
        assert!(console.contains("Want form --{option_name}={option_value}"));
        assert_eq!(summary.report.completed(), 1);
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = quiet_config();
        config.output.format = "text".to_string();

        let (summary, _) = run_captured(&[], &config);
        assert_eq!(summary.report.format, OutputFormat::Text);

        let (summary, _) = run_captured(&["--output_format=plain", "--min_iterations=3"], &config);
        assert_eq!(summary.report.format, OutputFormat::Unknown);
        assert_eq!(summary.report.results[0].iterations(), 4);
    }

    #[test]
    fn test_output_file_from_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("results");
        let mut config = quiet_config();
        config.output.file = path.display().to_string();

        let (summary, console) = run_captured(&[], &config);
        assert_eq!(summary.destination, ReportDestination::File(path.clone()));
        assert_eq!(console, format!("Generated {}.\n", path.display()));
        assert!(std::fs::read_to_string(&path).unwrap().contains("Name bm_spin"));
    }

    #[test]
    fn test_root_dir_runs_advisories_in_test_mode() {
        let temp = TempDir::new().unwrap();
        let arg = format!("--test_root_dir={}", temp.path().display());
        let (summary, console) = run_captured(&[&arg], &quiet_config());

        assert!(summary.options.any_test_flag_set);
        assert!(summary.advisories.is_empty());
        assert!(console.contains(&format!("TEST FLAG SET: {arg}")));
        assert!(console.contains("Checking sysfs@"));
        assert!(console.contains("Failed to open "));
    }

    #[test]
    fn test_resolve_format() {
        let mut config = CycleConfig::default();
        assert_eq!(resolve_format(&Options::default(), &config), OutputFormat::Unknown);
        config.output.format = "TEXT".to_string();
        assert_eq!(resolve_format(&Options::default(), &config), OutputFormat::Text);
    }

    #[test]
    fn test_registration_errors_are_printed() {
        let mut registry = Registry::new();
        let err = registry
            .try_register("ghost", None::<fn(&mut Bencher)>)
            .unwrap_err();
        let mut console = Vec::new();
        report_registration_errors(&[err], &mut console).unwrap();
        assert!(
            String::from_utf8(console)
                .unwrap()
                .starts_with("Failed to register benchmark: No benchmark passed")
        );
    }
}
