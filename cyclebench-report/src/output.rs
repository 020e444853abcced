//! Report Output
//!
//! Writes rendered report text to a file or standard output. A file that
//! cannot be written is never fatal: the text goes to standard output instead.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Where the report text ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportDestination {
    /// Standard output, as requested
    Stdout,
    /// The requested file
    File(PathBuf),
    /// Standard output, after the requested file failed
    Fallback {
        /// File that could not be written
        path: PathBuf,
        /// Reason the write failed
        reason: String,
    },
}

/// Write `text` to `path`, or to `console` when `path` is `None` or empty.
///
/// Only errors on `console` are returned; file errors fall back to it.
pub fn write_report_to<W: Write>(
    text: &str,
    path: Option<&Path>,
    console: &mut W,
) -> io::Result<ReportDestination> {
    let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
        console.write_all(text.as_bytes())?;
        return Ok(ReportDestination::Stdout);
    };

    match std::fs::write(path, text) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), bytes = text.len(), "report written");
            writeln!(console, "Generated {}.", path.display())?;
            Ok(ReportDestination::File(path.to_path_buf()))
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "could not write report: {e}");
            writeln!(
                console,
                "Warning: could not write {} ({e}); writing results to standard output.",
                path.display()
            )?;
            console.write_all(text.as_bytes())?;
            Ok(ReportDestination::Fallback {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    }
}
