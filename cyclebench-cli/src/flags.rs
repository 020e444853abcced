//! Command-line flags
//!
//! Every flag has the form `--name=value`. A bad flag never aborts the run:
//! it is reported and parsing moves on, leaving that option at its default.

use cyclebench_report::OutputFormat;
use std::path::PathBuf;
use thiserror::Error;

const OUTPUT_FORMAT: &str = "output_format";
const OUTPUT_FILE: &str = "output_file";
const MIN_ITERATIONS: &str = "min_iterations";
const TEST_ROOT_DIR: &str = "test_root_dir";

/// Flags a misspelt name can be pointed at. Testing flags are left out.
const SUGGESTABLE: &[&str] = &[OUTPUT_FORMAT, OUTPUT_FILE, MIN_ITERATIONS];

/// A rejected command-line flag
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// Not of the form `--name=value`
    #[error("Error with flag. Got {arg}. Want form --{{option_name}}={{option_value}}")]
    Malformed {
        /// Argument as given
        arg: String,
    },
    /// Value does not parse as the flag's type
    #[error("Error with flag {arg}. Parsed flag value does not match flag's declared type ({expected})")]
    TypeMismatch {
        /// Argument as given
        arg: String,
        /// Type the flag takes
        expected: &'static str,
    },
    /// No flag with this name
    #[error("Error with flag {arg}. Unknown option_name {name}{}", suggestion(.closest))]
    UnknownName {
        /// Argument as given
        arg: String,
        /// Name part of the argument
        name: String,
        /// Known flag sharing the first letter
        closest: Option<&'static str>,
    },
}

fn suggestion(closest: &Option<&'static str>) -> String {
    closest.map(|c| format!(". Maybe {c}?")).unwrap_or_default()
}

/// Options collected from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Name of the benchmark binary (`argv[0]`)
    pub binary_name: String,
    /// `--output_format`, when given
    pub output_format: Option<OutputFormat>,
    /// `--output_file`, when given
    pub output_file: Option<PathBuf>,
    /// `--min_iterations`, when given
    pub min_iterations: Option<u64>,
    /// `--test_root_dir`: root prefixed to every sysfs probe
    pub test_root_dir: Option<PathBuf>,
    /// Set once any testing-only flag was accepted
    pub any_test_flag_set: bool,
}

impl Options {
    /// Parse `args`, whose first item is the binary name.
    ///
    /// Returns the options together with every rejected flag, in order.
    pub fn parse<I, S>(args: I) -> (Self, Vec<FlagError>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        let mut options = Options {
            binary_name: args
                .next()
                .map(|s| s.as_ref().to_string())
                .unwrap_or_else(|| "cyclebench".to_string()),
            ..Default::default()
        };

        let mut errors = Vec::new();
        for arg in args {
            if let Err(e) = options.insert_flag(arg.as_ref()) {
                tracing::debug!("rejected flag: {e}");
                errors.push(e);
            }
        }
        (options, errors)
    }

    /// Apply one `--name=value` argument. An empty argument is ignored.
    pub fn insert_flag(&mut self, arg: &str) -> Result<(), FlagError> {
        if arg.is_empty() {
            return Ok(());
        }
        let malformed = || FlagError::Malformed {
            arg: arg.to_string(),
        };

        let body = arg.strip_prefix("--").ok_or_else(malformed)?;
        let (name, value) = body.split_once('=').ok_or_else(malformed)?;
        if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) || value.is_empty() {
            return Err(malformed());
        }

        match name {
            OUTPUT_FORMAT => {
                let format: OutputFormat = value.parse().unwrap_or_default();
                if format == OutputFormat::Unknown {
                    tracing::warn!(value, "unrecognized output format, using the plain layout");
                }
                self.output_format = Some(format);
            }
            OUTPUT_FILE => self.output_file = Some(PathBuf::from(value)),
            MIN_ITERATIONS => {
                let n = value.parse::<u64>().map_err(|_| FlagError::TypeMismatch {
                    arg: arg.to_string(),
                    expected: "unsigned integer",
                })?;
                self.min_iterations = Some(n);
            }
            TEST_ROOT_DIR => {
                self.test_root_dir = Some(PathBuf::from(value));
                self.any_test_flag_set = true;
            }
            _ => {
                return Err(FlagError::UnknownName {
                    arg: arg.to_string(),
                    name: name.to_string(),
                    closest: closest_flag(name),
                });
            }
        }
        Ok(())
    }

    /// Output format, `Unknown` unless a flag set it
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.unwrap_or_default()
    }
}

/// First known flag that starts with the same letter as `name`
fn closest_flag(name: &str) -> Option<&'static str> {
    let first = name.chars().next()?;
    SUGGESTABLE.iter().copied().find(|flag| flag.starts_with(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> (Options, Vec<FlagError>) {
        Options::parse(std::iter::once("./bm").chain(args.iter().copied()))
    }

    #[test]
    fn test_no_flags() {
        let (options, errors) = parse(&[]);
        assert!(errors.is_empty());
        assert_eq!(options.binary_name, "./bm");
        assert_eq!(options.output_format(), OutputFormat::Unknown);
        assert_eq!(options.output_file, None);
    }

    #[test]
    fn test_output_flags() {
        let (options, errors) = parse(&["--output_format=Text", "--output_file=results"]);
        assert!(errors.is_empty());
        assert_eq!(options.output_format(), OutputFormat::Text);
        assert_eq!(options.output_file, Some(PathBuf::from("results")));
    }

    #[test]
    fn test_unrecognized_format_is_unknown() {
        let (options, errors) = parse(&["--output_format=csv"]);
        assert!(errors.is_empty());
        assert_eq!(options.output_format, Some(OutputFormat::Unknown));
    }

    #[test]
    fn test_missing_value_is_malformed() {
        let (options, errors) = parse(&["--output_format"]);
        assert_eq!(
            errors,
            [FlagError::Malformed {
                arg: "--output_format".to_string()
            }]
        );
        assert_eq!(options.output_format(), OutputFormat::Unknown);
        assert!(errors[0].to_string().contains("Want form --{option_name}={option_value}"));
    }

    #[test]
    fn test_empty_values_are_malformed() {
        let (options, errors) = parse(&["--output_format=", "--output_file="]);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, FlagError::Malformed { .. })));
        assert_eq!(options.output_file, None);
    }

    #[test]
    fn test_bad_shapes_are_malformed() {
        for arg in ["output_format=text", "-output_format=text", "--=text", "--_x=1"] {
            let (_, errors) = parse(&[arg]);
            assert!(
                matches!(errors.as_slice(), [FlagError::Malformed { .. }]),
                "{arg} should be malformed"
            );
        }
    }

    #[test]
    fn test_empty_argument_is_ignored() {
        let (options, errors) = parse(&["", "--output_format=text"]);
        assert!(errors.is_empty());
        assert_eq!(options.output_format(), OutputFormat::Text);
    }

    #[test]
    fn test_type_mismatch() {
        let (options, errors) = parse(&["--min_iterations=many", "--min_iterations=-1"]);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], FlagError::TypeMismatch { .. }));
        assert_eq!(options.min_iterations, None);

        let (options, _) = parse(&["--min_iterations=250"]);
        assert_eq!(options.min_iterations, Some(250));
    }

    #[test]
    fn test_unknown_name_with_hint() {
        let (_, errors) = parse(&["--output_fmt=text"]);
        assert_eq!(
            errors,
            [FlagError::UnknownName {
                arg: "--output_fmt=text".to_string(),
                name: "output_fmt".to_string(),
                closest: Some("output_format"),
            }]
        );
        assert!(errors[0].to_string().ends_with("Maybe output_format?"));
    }

    #[test]
    fn test_unknown_test_flag_has_no_hint() {
        let (_, errors) = parse(&["--test_root=/tmp"]);
        assert!(matches!(
            &errors[0],
            FlagError::UnknownName { closest: None, .. }
        ));
        assert!(errors[0].to_string().ends_with("Unknown option_name test_root"));
    }

    #[test]
    fn test_prefix_is_not_accepted() {
        let (options, errors) = parse(&["--output_format_extra=text"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(options.output_format, None);
    }

    #[test]
    fn test_root_dir_sets_test_mode() {
        let (options, errors) = parse(&["--test_root_dir=/tmp/fake/"]);
        assert!(errors.is_empty());
        assert!(options.any_test_flag_set);
        assert_eq!(options.test_root_dir, Some(PathBuf::from("/tmp/fake/")));
    }

    #[test]
    fn test_errors_do_not_stop_parsing() {
        let (options, errors) = parse(&["--bogus=1", "--output_file=out.txt", "junk"]);
        assert_eq!(errors.len(), 2);
        assert_eq!(options.output_file, Some(PathBuf::from("out.txt")));
    }
}
