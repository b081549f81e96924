//! CLI-wide configuration (`scenario-miner.toml`).
//!
//! Parsed once at startup. Missing fields use sensible defaults; a missing
//! file is not an error — it degrades to all defaults, matching the
//! convention the rest of this ecosystem uses for optional repo-level
//! config files.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MinerToolConfig {
    /// Mining defaults.
    #[serde(default)]
    pub mining: MiningConfig,

    /// Sandbox/evaluation defaults.
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

/// Mining-specific settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MiningConfig {
    /// Default sliding window size, overridable by `--sliding-window-size`.
    #[serde(default = "default_window_size")]
    pub sliding_window_size: usize,

    /// Default language filter, overridable by `--programming-language`.
    #[serde(default = "default_language")]
    pub programming_language: String,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            sliding_window_size: default_window_size(),
            programming_language: default_language(),
        }
    }
}

const fn default_window_size() -> usize {
    3
}

fn default_language() -> String {
    "python".to_owned()
}

/// Sandbox/evaluation settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    /// Container image used for scenario replay.
    #[serde(default = "default_image")]
    pub image: String,

    /// Seconds before an in-container command is killed by `timeout`.
    #[serde(default = "default_exec_timeout_secs")]
    pub exec_timeout_secs: u64,

    /// Maximum bytes of stdout+stderr retained per `exec` call.
    #[serde(default = "default_output_cap_bytes")]
    pub output_cap_bytes: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            exec_timeout_secs: default_exec_timeout_secs(),
            output_cap_bytes: default_output_cap_bytes(),
        }
    }
}

fn default_image() -> String {
    "ubuntu:22.04".to_owned()
}

const fn default_exec_timeout_secs() -> u64 {
    120
}

const fn default_output_cap_bytes() -> usize {
    64 * 1024
}

/// Failure loading or parsing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file's contents are not valid TOML for this schema.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl MinerToolConfig {
    /// Load configuration from `path`. A missing file yields defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_returns_defaults() {
        let config = MinerToolConfig::load(Path::new("/nonexistent/scenario-miner.toml")).expect("defaults");
        assert_eq!(config, MinerToolConfig::default());
    }

    #[test]
    fn load_existing_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scenario-miner.toml");
        std::fs::write(&path, "[mining]\nsliding_window_size = 5\n").expect("write");

        let config = MinerToolConfig::load(&path).expect("parses");
        assert_eq!(config.mining.sliding_window_size, 5);
        assert_eq!(config.mining.programming_language, "python");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scenario-miner.toml");
        std::fs::write(&path, "[mining]\nbogus = true\n").expect("write");

        assert!(MinerToolConfig::load(&path).is_err());
    }
}
