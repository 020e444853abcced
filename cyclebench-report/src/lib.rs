#![warn(missing_docs)]
//! CycleBench Report - Result Output
//!
//! Turns finalized benchmark results into report text:
//! - `Report`, the model handed over by the driver
//! - Text rendering (`Text` and the plain `Unknown` layout)
//! - Output to a file, falling back to the console stream

mod output;
mod report;

pub use output::{ReportDestination, write_report_to};
pub use report::{Report, format_text};

/// Output format selection
///
/// Parsing never fails: anything other than `text` becomes `Unknown`, which
/// renders with a plain space delimiter and no format banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// No format requested (or an unrecognized one)
    #[default]
    Unknown,
    /// `Name : value` lines
    Text,
}

impl OutputFormat {
    /// Delimiter between a field label and its value
    pub fn delimiter(self) -> &'static str {
        match self {
            OutputFormat::Text => " : ",
            OutputFormat::Unknown => " ",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("text") {
            Ok(OutputFormat::Text)
        } else {
            Ok(OutputFormat::Unknown)
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Unknown => write!(f, "Unknown"),
            OutputFormat::Text => write!(f, "Text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_format() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("Text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Unknown);
        assert_eq!("".parse::<OutputFormat>().unwrap(), OutputFormat::Unknown);
    }

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(OutputFormat::default(), OutputFormat::Unknown);
        assert_eq!(OutputFormat::default().to_string(), "Unknown");
    }
}
