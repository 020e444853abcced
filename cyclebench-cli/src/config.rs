//! Configuration loading from cyclebench.toml
//!
//! Settings can be kept in a `cyclebench.toml` file next to the benchmark
//! crate. The file is discovered by walking up from the current directory.
//! Command-line flags override anything set here.

use cyclebench_core::DEFAULT_MIN_ITERATIONS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for during discovery
pub const CONFIG_FILE_NAME: &str = "cyclebench.toml";

/// Errors loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Offending file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// File is not valid TOML for this schema
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Offending file
        path: PathBuf,
        /// Underlying TOML error
        source: toml::de::Error,
    },
}

/// CycleBench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CycleConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// System-tuning advisory configuration
    #[serde(default)]
    pub advisories: AdvisoryConfig,
}

/// Runner configuration for benchmark execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerConfig {
    /// A run ends once its iteration count exceeds this
    #[serde(default = "default_min_iterations")]
    pub min_iterations: u64,
    /// Core to pin the benchmark thread to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_cpu: Option<usize>,
    /// Draw a progress bar on stderr
    #[serde(default = "default_true")]
    pub progress: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            min_iterations: default_min_iterations(),
            pin_cpu: None,
            progress: true,
        }
    }
}

fn default_min_iterations() -> u64 {
    DEFAULT_MIN_ITERATIONS
}
fn default_true() -> bool {
    true
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    /// Output format; `text` or empty
    #[serde(default)]
    pub format: String,
    /// Report file; empty means standard output
    #[serde(default)]
    pub file: String,
}

/// System-tuning advisory configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdvisoryConfig {
    /// Probe sysfs before running
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl CycleConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Walk up from `start` and load the first `cyclebench.toml` found.
    ///
    /// `Ok(None)` when no file exists on the way to the filesystem root.
    pub fn discover_from(start: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        match find_config_file(start.as_ref()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Self::load(&path).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Discover configuration starting from the current directory
    pub fn discover() -> Result<Option<Self>, ConfigError> {
        match std::env::current_dir() {
            Ok(dir) => Self::discover_from(dir),
            Err(_) => Ok(None),
        }
    }

    /// Render this configuration as a `cyclebench.toml` document
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let body = toml::to_string_pretty(self)?;
        Ok(format!("# CycleBench Configuration\n\n{body}"))
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        Self::default().to_toml()
    }
}

/// Nearest `cyclebench.toml` at or above `start`
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CycleConfig::default();
        assert_eq!(config.runner.min_iterations, 1000);
        assert_eq!(config.runner.pin_cpu, None);
        assert!(config.advisories.enabled);
        assert!(config.output.file.is_empty());
    }

    #[test]
    fn test_default_toml_matches_defaults() {
        let text = CycleConfig::default_toml().unwrap();
        assert!(text.starts_with("# CycleBench Configuration\n"));
        assert!(!text.contains("pin_cpu"));
        let config: CycleConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, CycleConfig::default());
    }

    #[test]
    fn test_written_config_loads_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);

        let mut config = CycleConfig::default();
        config.runner.min_iterations = 250;
        config.runner.pin_cpu = Some(1);
        config.output.format = "text".to_string();
        config.advisories.enabled = false;
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("min_iterations = 250"));
        assert!(text.contains("pin_cpu = 1"));
        assert_eq!(CycleConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[runner]
min_iterations = 50
pin_cpu = 3

[output]
format = "text"
"#;
        let config: CycleConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.min_iterations, 50);
        assert_eq!(config.runner.pin_cpu, Some(3));
        assert!(config.runner.progress);
        assert_eq!(config.output.format, "text");
        assert!(config.advisories.enabled);
    }

    #[test]
    fn test_discover_walks_up() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[advisories]\nenabled = false\n",
        )
        .unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = CycleConfig::discover_from(&nested).unwrap().unwrap();
        assert!(!config.advisories.enabled);
    }

    #[test]
    fn test_invalid_config_reports_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[runner]\nmin_iterations = \"lots\"\n").unwrap();

        let err = CycleConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let temp = TempDir::new().unwrap();
        let err = CycleConfig::load(temp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
