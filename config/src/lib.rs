//! Configuration for ansible-ls.
//!
//! Two sources:
//!
//! - [`AnsibleLsConfig`]: the server's own TOML file
//!   (`~/.ansible-ls/config.toml`, or `$ANSIBLE_LS_CONFIG`). Read once at
//!   startup. A missing file means defaults.
//! - [`LinterSettings`]: the client's `ansibleLinter` section, delivered with
//!   `workspace/didChangeConfiguration`.

use std::path::{Path, PathBuf};
use std::{env, fs};

use ansible_ls_types::DEFAULT_CHECKER;
use serde::Deserialize;

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "ANSIBLE_LS_CONFIG";

/// Used when the client sends no (or a non-positive) problem limit.
pub const DEFAULT_MAX_NUMBER_OF_PROBLEMS: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnsibleLsConfig {
    pub checker: CheckerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Checker executable, looked up in `PATH` unless it contains a separator.
    /// Supports `${VAR}` expansion.
    pub command: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_CHECKER.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Append logs to this file instead of stderr. Supports `${VAR}` expansion.
    pub file: Option<PathBuf>,
    /// `EnvFilter` directive used when no log env var is set (e.g. "debug").
    pub filter: Option<String>,
}

impl AnsibleLsConfig {
    /// Load from the default location. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        let mut config: Self = match toml::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        config.checker.command = expand_env_vars(&config.checker.command);
        if let Some(file) = config.log.file.take() {
            config.log.file = Some(PathBuf::from(expand_env_vars(&file.to_string_lossy())));
        }
        Ok(config)
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".ansible-ls").join("config.toml"))
}

/// Replace `${VAR}` with the variable's value (empty when unset).
fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + len];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + len + 1..];
    }

    out.push_str(rest);
    out
}

/// Client-side settings from the `ansibleLinter` configuration section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinterSettings {
    max_number_of_problems: u32,
}

impl Default for LinterSettings {
    fn default() -> Self {
        Self {
            max_number_of_problems: DEFAULT_MAX_NUMBER_OF_PROBLEMS,
        }
    }
}

impl LinterSettings {
    /// Extract from the `settings` object of `workspace/didChangeConfiguration`.
    ///
    /// Missing sections, non-integers and values `<= 0` fall back to the default.
    #[must_use]
    pub fn from_settings(settings: &serde_json::Value) -> Self {
        let max_number_of_problems = settings
            .get("ansibleLinter")
            .and_then(|linter| linter.get("maxNumberOfProblems"))
            .and_then(serde_json::Value::as_i64)
            .filter(|n| *n > 0)
            .map_or(DEFAULT_MAX_NUMBER_OF_PROBLEMS, |n| {
                u32::try_from(n).unwrap_or(u32::MAX)
            });
        Self {
            max_number_of_problems,
        }
    }

    /// Accepted from the client but not applied to published batches.
    #[must_use]
    pub fn max_number_of_problems(&self) -> u32 {
        self.max_number_of_problems
    }
}
