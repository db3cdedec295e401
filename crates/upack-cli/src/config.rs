//! Configuration file discovery.

use anyhow::Context;
use anyhow::Result;
use std::env;
use std::path::Path;
use std::path::PathBuf;
use upack_core::Config;

/// File name looked up next to the executable.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Picks the configuration file: the explicit path (from `--config` or
/// `UPACK_CONFIG`), else `config.toml` beside the running executable.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let exe = env::current_exe().context("failed to locate the upack executable")?;
    Ok(beside(&exe))
}

fn beside(exe: &Path) -> PathBuf {
    exe.parent()
        .map_or_else(|| PathBuf::from(CONFIG_FILE_NAME), |dir| dir.join(CONFIG_FILE_NAME))
}

/// Locates and loads the configuration.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = locate(explicit)?;
    tracing::debug!(path = %path.display(), "loading configuration");
    Config::load(&path).map_err(|err| crate::error::convert_config_error(&err))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_path_wins() {
        let path = locate(Some(Path::new("/etc/upack/custom.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("/etc/upack/custom.toml"));
    }

    #[test]
    fn test_default_is_beside_executable() {
        assert_eq!(
            beside(Path::new("/opt/upack/bin/upack")),
            PathBuf::from("/opt/upack/bin/config.toml")
        );
    }

    #[test]
    fn test_load_reports_search_path() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("config.toml");
        let err = load(Some(&missing)).unwrap_err();
        let msg = format!("{err:?}");
        assert!(msg.contains("config.toml"));
        assert!(msg.contains("HINT"));
    }

    #[test]
    fn test_load_valid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "[paths]\ndir_ppk_tmp = \"/tmp/ppk\"\ndir_pip_repo = \"/srv/repo\"\n",
        )
        .unwrap();
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.repository_dir(), Path::new("/srv/repo"));
    }
}
