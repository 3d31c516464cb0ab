//! Mirror-fallback downloads.
//!
//! A [`Fetcher`] walks an ordered candidate list. Each candidate gets a
//! small fixed number of attempts (see [`RetryConfig`]) under the
//! transport's per-attempt timeout before the next candidate is tried.
//! Candidates are never tried concurrently.
//!
//! # Testing
//!
//! Use [`MockTransport`](crate::mock::MockTransport) for testing without
//! network access.

pub mod http;

use crate::error::{FetchError, TransferError};
use crate::retry::{RetryCallback, RetryConfig, with_retry};
use std::fmt;
use std::path::Path;

pub use http::HttpTransport;

/// Moves one resource from a source to a local file.
pub trait Transport {
    /// Download `url` into `dest`, returning the number of bytes written.
    ///
    /// Implementations bound each call by their own timeout.
    fn download(&self, url: &str, dest: &Path) -> Result<u64, TransferError>;
}

/// Successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    /// Sources tried, in order, ending with `source`
    pub attempted: Vec<String>,
    /// Source that delivered the resource
    pub source: String,
    pub bytes: u64,
}

/// Mirror-fallback downloader.
pub struct Fetcher {
    transport: Box<dyn Transport>,
    retry: RetryConfig,
}

impl Fetcher {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch the first candidate that succeeds into `dest`.
    ///
    /// Fails only after every candidate has been exhausted; the error lists
    /// all attempted sources and carries the last one's failure.
    pub fn fetch(&self, candidates: &[String], dest: &Path) -> Result<FetchReport, FetchError> {
        let mut attempted = Vec::with_capacity(candidates.len());
        let mut terminal = None;

        for candidate in candidates {
            attempted.push(candidate.clone());
            log::info!("fetching {candidate}");

            let notify = LogRetry { source: candidate };
            let result = with_retry(&self.retry, Some(&notify), |_| {
                self.transport.download(candidate, dest)
            });

            match result {
                Ok(bytes) => {
                    return Ok(FetchReport {
                        attempted,
                        source: candidate.clone(),
                        bytes,
                    });
                }
                Err(err) => {
                    log::warn!("{candidate} failed: {err}");
                    // Never leave a partial download behind for the next mirror.
                    if let Err(e) = std::fs::remove_file(dest)
                        && e.kind() != std::io::ErrorKind::NotFound
                    {
                        log::debug!("could not remove {}: {e}", dest.display());
                    }
                    terminal = Some(err);
                }
            }
        }

        Err(FetchError {
            attempted,
            terminal,
        })
    }
}

struct LogRetry<'a> {
    source: &'a str,
}

impl RetryCallback for LogRetry<'_> {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &dyn fmt::Display) {
        log::warn!(
            "attempt {attempt}/{max_attempts} for {} failed: {error}",
            self.source
        );
    }
}

/// Expand `{version}` in every mirror template.
pub fn expand_templates(templates: &[String], version: &str) -> Vec<String> {
    templates
        .iter()
        .map(|t| t.replace("{version}", version))
        .collect()
}
