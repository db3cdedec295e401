//! Unpacker configuration.
//!
//! Loaded once from a TOML file and passed by reference to the pipeline.
//!
//! ```toml
//! [paths]
//! dir_ppk_tmp = "/tmp/ppk"
//! dir_pip_repo = "/var/pip/repo"
//!
//! [tools]
//! sevenzip = "7z"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::Result;
use crate::UnpackError;

/// Complete configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Directory locations.
    pub paths: PathsConfig,

    /// External programs.
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// The `[paths]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathsConfig {
    /// Staging directory the archive is extracted into. Its parent must
    /// exist; the directory itself is created and removed by each run.
    #[serde(rename = "dir_ppk_tmp")]
    pub staging_dir: PathBuf,

    /// Trusted repository receiving validated files. Must already exist.
    #[serde(rename = "dir_pip_repo")]
    pub repository_dir: PathBuf,
}

/// The `[tools]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolsConfig {
    /// 7-Zip program name or path.
    #[serde(default = "default_sevenzip")]
    pub sevenzip: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            sevenzip: default_sevenzip(),
        }
    }
}

fn default_sevenzip() -> PathBuf {
    PathBuf::from("7z")
}

impl Config {
    /// Creates a configuration from explicit paths with default tools.
    pub fn new(staging_dir: impl Into<PathBuf>, repository_dir: impl Into<PathBuf>) -> Self {
        Self {
            paths: PathsConfig {
                staging_dir: staging_dir.into(),
                repository_dir: repository_dir.into(),
            },
            tools: ToolsConfig::default(),
        }
    }

    /// Reads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// `Config` if the file cannot be read or parsed, or a required path is
    /// missing or empty.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| UnpackError::Config {
            path: path.to_path_buf(),
            reason: format!("cannot read file: {e}"),
        })?;
        Self::parse(&contents, path)
    }

    /// Parses configuration text; `origin` is used in error messages only.
    pub fn parse(contents: &str, origin: &Path) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| UnpackError::Config {
            path: origin.to_path_buf(),
            reason: e.message().to_string(),
        })?;
        config.validate(origin)?;
        Ok(config)
    }

    fn validate(&self, origin: &Path) -> Result<()> {
        let required = [
            ("paths.dir_ppk_tmp", &self.paths.staging_dir),
            ("paths.dir_pip_repo", &self.paths.repository_dir),
            ("tools.sevenzip", &self.tools.sevenzip),
        ];
        for (key, value) in required {
            if value.as_os_str().is_empty() {
                return Err(UnpackError::Config {
                    path: origin.to_path_buf(),
                    reason: format!("`{key}` must not be empty"),
                });
            }
        }
        Ok(())
    }

    /// Staging directory.
    #[must_use]
    pub fn staging_dir(&self) -> &Path {
        &self.paths.staging_dir
    }

    /// Repository directory.
    #[must_use]
    pub fn repository_dir(&self) -> &Path {
        &self.paths.repository_dir
    }
}
