//! Optional settings file (`config.toml`)
//!
//! Every key has a default, so a missing file or a partial file is fine.

use actionkit::{PollConfig, RetryConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

/// Pause between two attempts against the same mirror
const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Package manifest; defaults to `package_list.txt` beside the executable
    pub manifest: Option<String>,

    /// Directory holding the suckless source trees
    pub suckless_dir: String,

    pub emacs_default_version: String,
    pub emacs_configure_flags: Vec<String>,

    /// Mirror URL templates, tried in order; `{version}` is substituted
    pub emacs_mirrors: Vec<String>,
    pub stow_mirrors: Vec<String>,

    /// Per-attempt download timeout
    pub fetch_timeout_secs: u64,
    /// Attempts per mirror
    pub fetch_attempts: u32,

    pub display_poll_attempts: u32,
    pub display_poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest: None,
            suckless_dir: "~/projects/programs/suckless".to_string(),
            emacs_default_version: "30.1".to_string(),
            emacs_configure_flags: [
                "--with-x-toolkit=gtk3",
                "--with-native-compilation",
                "--with-json",
                "--with-tree-sitter",
                "--with-cairo",
                "--with-modules",
            ]
            .map(String::from)
            .to_vec(),
            emacs_mirrors: [
                "https://ftp.gnu.org/gnu/emacs/emacs-{version}.tar.gz",
                "https://ftpmirror.gnu.org/emacs/emacs-{version}.tar.gz",
                "https://mirrors.kernel.org/gnu/emacs/emacs-{version}.tar.gz",
            ]
            .map(String::from)
            .to_vec(),
            stow_mirrors: [
                "https://ftp.gnu.org/gnu/stow/stow-latest.tar.gz",
                "https://ftpmirror.gnu.org/stow/stow-latest.tar.gz",
                "https://mirrors.kernel.org/gnu/stow/stow-latest.tar.gz",
            ]
            .map(String::from)
            .to_vec(),
            fetch_timeout_secs: 30,
            fetch_attempts: 2,
            display_poll_attempts: 10,
            display_poll_interval_ms: 500,
        }
    }
}

impl Config {
    /// Load from `path`, or return defaults if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Manifest path: explicit override, then config key, then default location
    pub fn manifest_path(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = cli_override {
            return Ok(path.to_path_buf());
        }
        match &self.manifest {
            Some(path) => Ok(paths::expand(path)),
            None => paths::default_manifest(),
        }
    }

    pub fn suckless_path(&self) -> PathBuf {
        paths::expand(&self.suckless_dir)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::new(self.fetch_attempts, RETRY_DELAY)
    }

    pub fn poll(&self) -> PollConfig {
        PollConfig {
            attempts: self.display_poll_attempts.max(1),
            interval: Duration::from_millis(self.display_poll_interval_ms),
        }
    }
}
