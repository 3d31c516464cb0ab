//! Error types for action execution and downloads.
//!
//! Transfer errors are categorized so the retry loop can tell transient
//! failures (worth a second attempt) from permanent ones. Every
//! [`ActionError`] is non-fatal: the executor turns it into an
//! [`ActionResult::Failure`](crate::ActionResult::Failure) carrying its
//! display text.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Categories of transfer errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection, DNS or timeout problems (transient, retryable).
    Network,
    /// The source answered but does not have the resource.
    NotFound,
    /// Local filesystem problem while writing the destination.
    Io,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Resource not found on mirror",
            Self::Io => "Could not write download",
            Self::Other => "Unexpected error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A single failed transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Connection refused, DNS failure, reset, ...
    #[error("network error: {message}")]
    Network {
        /// Detail from the transport
        message: String,
    },

    /// The per-attempt timeout elapsed
    #[error("timed out after {secs}s")]
    Timeout {
        /// Configured timeout in seconds
        secs: u64,
    },

    /// The server answered with a non-success status
    #[error("HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// Writing the destination failed
    #[error("I/O error: {message}")]
    Io {
        /// Detail from the filesystem
        message: String,
    },
}

impl TransferError {
    /// Category used by the retry loop.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => ErrorCategory::Network,
            Self::Status { status } if *status == 404 || *status == 410 => ErrorCategory::NotFound,
            Self::Status { status } if *status >= 500 => ErrorCategory::Network,
            Self::Status { .. } => ErrorCategory::Other,
            Self::Io { .. } => ErrorCategory::Io,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<io::Error> for TransferError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

/// Every candidate source failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    /// Sources tried, in order
    pub attempted: Vec<String>,
    /// Error of the last source tried; `None` when there were no candidates
    pub terminal: Option<TransferError>,
}

impl FetchError {
    /// Source whose error is terminal
    pub fn last_source(&self) -> Option<&str> {
        self.attempted.last().map(String::as_str)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.last_source(), &self.terminal) {
            (Some(source), Some(err)) => write!(
                f,
                "all {} mirror(s) failed (tried {}); last error from {}: {}",
                self.attempted.len(),
                self.attempted.join(", "),
                source,
                err
            ),
            _ => write!(f, "no mirrors configured"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.terminal
            .as_ref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

/// Errors raised while executing an action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A tool, directory, section or sub-path the action depends on is absent
    #[error("{0}")]
    PrerequisiteMissing(String),

    /// A subprocess exited non-zero; carries its diagnostic output
    #[error("{step} failed: {stderr}")]
    Subprocess {
        /// Human-readable step name
        step: String,
        /// Command line that failed
        command: String,
        /// Trimmed stderr (or stdout when stderr was empty)
        stderr: String,
    },

    /// A subprocess could not be started at all
    #[error("failed to execute {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// All mirrors exhausted
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Unknown action id typed by the operator
    #[error("invalid option")]
    InvalidSelection(String),

    /// Privilege elevation is unavailable or was refused
    #[error("privilege elevation unavailable: {0}")]
    Privilege(String),

    /// Local filesystem operation failed
    #[error("{step}: {}: {source}", .path.display())]
    Io {
        step: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A step failed for a reason other than a subprocess exit status
    #[error("{step} failed: {message}")]
    Step { step: String, message: String },
}

impl ActionError {
    pub fn io(step: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            step: step.into(),
            path: path.into(),
            source,
        }
    }

    pub fn step(step: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Step {
            step: step.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_categories() {
        let net = TransferError::Network {
            message: "refused".into(),
        };
        assert!(net.is_retryable());
        assert!(TransferError::Timeout { secs: 30 }.is_retryable());
        assert!(TransferError::Status { status: 503 }.is_retryable());
        assert_eq!(
            TransferError::Status { status: 404 }.category(),
            ErrorCategory::NotFound
        );
        assert!(!TransferError::Status { status: 404 }.is_retryable());
        assert!(
            !TransferError::Io {
                message: "disk full".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_fetch_error_names_terminal_source() {
        let err = FetchError {
            attempted: vec!["A".into(), "B".into(), "C".into()],
            terminal: Some(TransferError::Status { status: 404 }),
        };
        assert_eq!(err.last_source(), Some("C"));
        let text = err.to_string();
        assert!(text.contains("tried A, B, C"));
        assert!(text.contains("last error from C: HTTP 404"));
    }

    #[test]
    fn test_fetch_error_no_candidates() {
        let err = FetchError {
            attempted: vec![],
            terminal: None,
        };
        assert_eq!(err.to_string(), "no mirrors configured");
    }

    #[test]
    fn test_invalid_selection_display() {
        assert_eq!(
            ActionError::InvalidSelection("bogus".into()).to_string(),
            "invalid option"
        );
    }

    #[test]
    fn test_subprocess_display_includes_diagnostic() {
        let err = ActionError::Subprocess {
            step: "Installing dev packages".into(),
            command: "apt install -y gcc".into(),
            stderr: "E: Unable to locate package gcc".into(),
        };
        assert_eq!(
            err.to_string(),
            "Installing dev packages failed: E: Unable to locate package gcc"
        );
    }
}
