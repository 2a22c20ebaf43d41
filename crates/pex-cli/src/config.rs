//! Batch file: a working directory and the command lines to run in it.
//!
//! ```yaml
//! dir: build        # optional; relative to this file's directory
//! commands:
//!   - make lint
//!   - cargo test --workspace
//! ```
//!
//! JSON works too, being a subset of YAML.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pex_model::CommandSpec;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("config commands is empty")]
    Empty,
    #[error("parse command line {line:?}: {source}")]
    CommandLine {
        line: String,
        #[source]
        source: shell_words::ParseError,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "is_empty_path")]
    pub dir: PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
}

fn is_empty_path(p: &Path) -> bool {
    p.as_os_str().is_empty()
}

impl Config {
    /// Reads, resolves and validates the config at `path`.
    ///
    /// After loading, `dir` is never empty: an empty `dir` becomes the config
    /// file's directory and a relative one is joined onto it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg: Config = serde_yaml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        cfg.resolve_dir(path);
        cfg.validate()?;
        Ok(cfg)
    }

    fn resolve_dir(&mut self, config_path: &Path) {
        let base = match config_path.parent() {
            Some(p) if !is_empty_path(p) => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if is_empty_path(&self.dir) {
            self.dir = base;
        } else if self.dir.is_relative() {
            self.dir = base.join(&self.dir);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.commands.is_empty() {
            return Err(ConfigError::Empty);
        }
        Ok(())
    }

    /// Splits each command line into a [`CommandSpec`] running in `dir_override`
    /// if given, else in the config's `dir`.
    ///
    /// Empty lines and lines without any word are skipped.
    pub fn command_specs(&self, dir_override: Option<&Path>) -> Result<Vec<CommandSpec>, ConfigError> {
        let cwd = dir_override.unwrap_or(&self.dir);

        let mut specs = Vec::with_capacity(self.commands.len());
        for line in &self.commands {
            if line.is_empty() {
                continue;
            }
            let argv = shell_words::split(line).map_err(|source| ConfigError::CommandLine {
                line: line.clone(),
                source,
            })?;
            let Some(spec) = CommandSpec::from_argv(argv) else {
                continue;
            };
            specs.push(spec.with_cwd(cwd));
        }
        Ok(specs)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
