//! Blocking HTTP transport.

use super::Transport;
use crate::error::TransferError;
use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Duration;

const USER_AGENT: &str = concat!("provisor/", env!("CARGO_PKG_VERSION"));

/// HTTP(S) transport with a per-request timeout covering the whole transfer.
pub struct HttpTransport {
    agent: ureq::Agent,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: config.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, err: ureq::Error) -> TransferError {
        match err {
            ureq::Error::StatusCode(status) => TransferError::Status { status },
            ureq::Error::Timeout(_) => TransferError::Timeout {
                secs: self.timeout.as_secs(),
            },
            ureq::Error::Io(io_err) if io_err.kind() == io::ErrorKind::TimedOut => {
                TransferError::Timeout {
                    secs: self.timeout.as_secs(),
                }
            }
            other => TransferError::Network {
                message: other.to_string(),
            },
        }
    }
}

impl Transport for HttpTransport {
    fn download(&self, url: &str, dest: &Path) -> Result<u64, TransferError> {
        let response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| self.map_error(e))?;

        let mut reader = response.into_body().into_reader();
        let mut file = File::create(dest)?;

        io::copy(&mut reader, &mut file).map_err(|err| match err.kind() {
            io::ErrorKind::TimedOut => TransferError::Timeout {
                secs: self.timeout.as_secs(),
            },
            _ => TransferError::Network {
                message: err.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_kept() {
        let transport = HttpTransport::new(Duration::from_secs(30));
        assert_eq!(transport.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_status_error_mapping() {
        let transport = HttpTransport::new(Duration::from_secs(5));
        assert_eq!(
            transport.map_error(ureq::Error::StatusCode(404)),
            TransferError::Status { status: 404 }
        );
    }
}
