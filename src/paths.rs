//! Centralized path resolution for provisor
//!
//! # Environment Variables
//!
//! - `PROVISOR_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/provisor`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `PROVISOR_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/provisor` (if set)
//! 3. `~/.config/provisor`
//!
//! For default_manifest():
//! 1. `package_list.txt` next to the executable
//! 2. `<config_dir>/package_list.txt`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "PROVISOR_CONFIG_DIR";

/// File name of the package manifest
pub const MANIFEST_FILE: &str = "package_list.txt";

/// File name of the optional settings file
pub const CONFIG_FILE: &str = "config.toml";

/// Get the provisor config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("provisor");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("provisor");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Default location of the settings file
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Default manifest location
///
/// Prefers a manifest shipped next to the executable, the way the
/// installer is usually run straight from a checkout.
pub fn default_manifest() -> Result<PathBuf> {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(MANIFEST_FILE)));
    manifest_from(beside_exe.as_deref(), &config_dir()?)
}

fn manifest_from(beside_exe: Option<&Path>, config_dir: &Path) -> Result<PathBuf> {
    match beside_exe {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        _ => Ok(config_dir.join(MANIFEST_FILE)),
    }
}

/// Home directory, for paths the settings actions manage
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("Could not determine home directory")
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as-is.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}
