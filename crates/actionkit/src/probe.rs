//! Tri-state status probes
//!
//! A [`Probe`] checks one prerequisite and then a list of configuration
//! markers against a [`HostQuery`]. It never mutates the host and never
//! fails: anything it cannot read counts as "marker absent".

use crate::context::HostQuery;
use std::fmt;
use std::path::PathBuf;

/// Readiness of a configurable setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusState {
    /// Every marker holds
    Configured,
    /// Prerequisite present, at least one marker missing
    NotConfigured,
    /// Prerequisite absent; the setting cannot apply
    Unavailable,
}

impl StatusState {
    /// Single-letter symbol shown next to a setting
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Configured => "O",
            Self::NotConfigured => "X",
            Self::Unavailable => "N",
        }
    }
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// What must be present before a setting can apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prerequisite {
    None,
    /// Executable on `PATH`
    Command(String),
    /// File or directory
    Path(PathBuf),
}

impl Prerequisite {
    pub fn command(name: impl Into<String>) -> Self {
        Self::Command(name.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    fn holds(&self, host: &dyn HostQuery) -> bool {
        match self {
            Self::None => true,
            Self::Command(name) => host.command_exists(name),
            Self::Path(path) => host.path_exists(path),
        }
    }
}

impl fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("nothing"),
            Self::Command(name) => write!(f, "command '{name}'"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One independent configuration marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Exists(PathBuf),
    /// File contains this exact line (surrounding whitespace ignored)
    ContainsLine { path: PathBuf, line: String },
    Executable(PathBuf),
    /// User service unit is both enabled and active
    ServiceActive(String),
}

impl Marker {
    pub fn exists(path: impl Into<PathBuf>) -> Self {
        Self::Exists(path.into())
    }

    pub fn contains_line(path: impl Into<PathBuf>, line: impl Into<String>) -> Self {
        Self::ContainsLine {
            path: path.into(),
            line: line.into(),
        }
    }

    pub fn executable(path: impl Into<PathBuf>) -> Self {
        Self::Executable(path.into())
    }

    pub fn service_active(unit: impl Into<String>) -> Self {
        Self::ServiceActive(unit.into())
    }

    fn holds(&self, host: &dyn HostQuery) -> bool {
        match self {
            Self::Exists(path) => host.path_exists(path),
            Self::ContainsLine { path, line } => match host.read_file(path) {
                Ok(content) => contains_line(&content, line),
                Err(e) => {
                    log::debug!("treating {} as absent: {e}", path.display());
                    false
                }
            },
            Self::Executable(path) => host.is_executable(path),
            Self::ServiceActive(unit) => {
                host.user_service_enabled(unit) && host.user_service_active(unit)
            }
        }
    }
}

/// Whether `content` has a line equal to `line`, ignoring surrounding whitespace
pub fn contains_line(content: &str, line: &str) -> bool {
    let wanted = line.trim();
    content.lines().any(|l| l.trim() == wanted)
}

/// Prerequisite plus markers for one setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    prerequisite: Prerequisite,
    markers: Vec<Marker>,
}

impl Probe {
    pub fn new(prerequisite: Prerequisite) -> Self {
        Self {
            prerequisite,
            markers: Vec::new(),
        }
    }

    #[must_use]
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn prerequisite(&self) -> &Prerequisite {
        &self.prerequisite
    }

    /// Compute the current state
    ///
    /// A missing prerequisite short-circuits to [`StatusState::Unavailable`]
    /// before any marker is inspected. Partial configuration is reported as
    /// [`StatusState::NotConfigured`].
    pub fn evaluate(&self, host: &dyn HostQuery) -> StatusState {
        if !self.prerequisite.holds(host) {
            return StatusState::Unavailable;
        }
        if self.markers.iter().all(|m| m.holds(host)) {
            StatusState::Configured
        } else {
            StatusState::NotConfigured
        }
    }
}
