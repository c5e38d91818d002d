//! XDG-compliant path resolution for trailmap.
//!
//! Provides `TrailPaths`: where the config file, the progress database,
//! backups and the TUI log live, following the XDG Base Directory Specification.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(trailmap::paths::no_home),
        help("Set the HOME environment variable or pass --data-dir and --config explicitly.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(trailmap::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Global XDG-compliant directories for trailmap.
#[derive(Debug, Clone)]
pub struct TrailPaths {
    /// `$XDG_CONFIG_HOME/trailmap/`
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME/trailmap/`
    pub data_dir: PathBuf,
    /// `$XDG_STATE_HOME/trailmap/`
    pub state_dir: PathBuf,
}

impl TrailPaths {
    /// Resolve XDG directories from environment variables with standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| PathError::NoHome)?;

        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".config"))
            .join("trailmap");

        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".local/share"))
            .join("trailmap");

        let state_dir = std::env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".local/state"))
            .join("trailmap");

        Ok(Self {
            config_dir,
            data_dir,
            state_dir,
        })
    }

    /// Root every directory under a single base (used by `--data-dir`).
    pub fn rooted(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config_dir: base.join("config"),
            data_dir: base.join("data"),
            state_dir: base.join("state"),
        }
    }

    /// Create all base directories. Idempotent.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        for dir in [
            &self.config_dir,
            &self.data_dir,
            &self.state_dir,
            &self.backups_dir(),
        ] {
            std::fs::create_dir_all(dir).map_err(|e| PathError::CreateDir {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Directory holding the redb progress database.
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("progress")
    }

    /// Default destination for backup exports.
    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    /// Log file used while the TUI owns the terminal.
    pub fn log_file(&self) -> PathBuf {
        self.state_dir.join("trailmap.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_paths_use_trailmap_dirs() {
        // Reads the real environment without mutating it (set_var is unsafe in edition 2024).
        let Ok(paths) = TrailPaths::resolve() else {
            return;
        };
        assert!(paths.config_dir.ends_with("trailmap"));
        assert!(paths.data_dir.ends_with("trailmap"));
        assert!(paths.state_dir.ends_with("trailmap"));
        assert!(paths.store_dir().starts_with(&paths.data_dir));
    }

    #[test]
    fn rooted_layout() {
        let paths = TrailPaths::rooted("/tmp/tm");
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/tm/config/config.toml"));
        assert_eq!(paths.store_dir(), PathBuf::from("/tmp/tm/data/progress"));
        assert_eq!(paths.backups_dir(), PathBuf::from("/tmp/tm/data/backups"));
        assert_eq!(paths.log_file(), PathBuf::from("/tmp/tm/state/trailmap.log"));
    }

    #[test]
    fn ensure_dirs_is_idempotent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = TrailPaths::rooted(tmp.path());
        paths.ensure_dirs().unwrap();
        paths.ensure_dirs().unwrap();
        assert!(paths.backups_dir().is_dir());
        assert!(paths.state_dir.is_dir());
    }
}
