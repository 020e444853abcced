//! System-tuning advisories
//!
//! Before running, a handful of sysfs/procfs files that are known sources of
//! measurement jitter are read and compared against the value a quiet
//! machine would report. A mismatch prints a remedy; a missing file is
//! skipped.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One probe: a file, the value we want to see in it, and what to do otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemCheck {
    /// Absolute path of the probed file
    pub path: &'static str,
    /// Expected first token of the file
    pub want: &'static str,
    /// Message printed on mismatch
    pub remedy: &'static str,
}

/// Built-in probes
pub const SYSFS_CHECKS: &[SystemCheck] = &[
    SystemCheck {
        path: "/sys/devices/system/cpu/intel_pstate/no_turbo",
        want: "1",
        remedy: "Warning: Chip power frequency scaling is on. Recommend turning it off for more accurate results.",
    },
    SystemCheck {
        path: "/sys/devices/system/cpu/cpu0/cpufreq/scaling_governor",
        want: "performance",
        remedy: "Warning: CPU frequency governor is not performance. Recommend the performance governor for more stable results.",
    },
    SystemCheck {
        path: "/proc/sys/kernel/randomize_va_space",
        want: "0",
        remedy: "Warning: Virtual address randomization is on. Recommend turning it off for more repeatable results.",
    },
];

/// A probe whose file did not hold the wanted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    /// File that was read
    pub path: PathBuf,
    /// First token found in the file (empty if none)
    pub found: String,
    /// The probe that failed
    pub check: SystemCheck,
}

/// Location of `check` under `root`, or the check's own path without a root.
pub fn probe_path(root: Option<&Path>, check: &SystemCheck) -> PathBuf {
    match root {
        Some(root) => root.join(check.path.trim_start_matches('/')),
        None => PathBuf::from(check.path),
    }
}

/// Run `checks`, printing remedies for mismatches to `console`.
///
/// In test mode every probed path is announced, and so is every file that
/// could not be opened.
pub fn scan<W: Write>(
    checks: &[SystemCheck],
    root: Option<&Path>,
    test_mode: bool,
    console: &mut W,
) -> io::Result<Vec<Advisory>> {
    let mut advisories = Vec::new();

    for check in checks {
        let path = probe_path(root, check);
        if test_mode {
            writeln!(console, "Checking sysfs@{}", path.display())?;
        }

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::debug!(path = %path.display(), "probe skipped: {e}");
                if test_mode {
                    writeln!(console, "Failed to open {}", path.display())?;
                }
                continue;
            }
        };

        let found = contents.split_whitespace().next().unwrap_or_default();
        if found != check.want {
            tracing::debug!(path = %path.display(), found, want = check.want, "system not tuned for benchmarking");
            writeln!(console, "{}", check.remedy)?;
            advisories.push(Advisory {
                path,
                found: found.to_string(),
                check: *check,
            });
        }
    }

    Ok(advisories)
}
