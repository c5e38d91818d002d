//! User configuration, persisted as TOML in `$XDG_CONFIG_HOME/trailmap/config.toml`.
//!
//! Every field has a default, so a missing file or a partial file is fine.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from config operations.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(trailmap::config::read),
        help("Ensure the config file is readable, or delete it to fall back to defaults.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}")]
    #[diagnostic(
        code(trailmap::config::parse),
        help("Check the TOML syntax. `trailmap config show` prints the effective configuration.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(trailmap::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Effective trailmap configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailConfig {
    /// Overrides the start date declared in the plan file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Length of one focus session, in minutes.
    #[serde(default = "default_session_minutes")]
    pub session_minutes: u32,
    /// Horizon for the linear expected-progress benchmark.
    #[serde(default = "default_total_plan_days")]
    pub total_plan_days: u32,
    /// Plan file to load instead of the bundled reference plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_file: Option<PathBuf>,
    /// Where the progress database lives (defaults to the XDG data dir).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_session_minutes() -> u32 {
    25
}
fn default_total_plan_days() -> u32 {
    365
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            start_date: None,
            session_minutes: default_session_minutes(),
            total_plan_days: default_total_plan_days(),
            plan_file: None,
            data_dir: None,
        }
    }
}

impl TrailConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from a TOML file, or return defaults if it doesn't exist.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Session length as a `Duration`; never zero.
    pub fn session_length(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.session_minutes.max(1)) * 60)
    }
}
