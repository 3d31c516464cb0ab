//! Error types for the manifest crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a manifest
#[derive(Error, Debug)]
pub enum Error {
    /// Manifest file does not exist
    #[error("manifest not found: {}", .0.display())]
    NotFound(PathBuf),

    /// IO error while reading the manifest
    #[error("failed to read manifest {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An item line appeared before any `[section]` header
    #[error("line {line}: item '{item}' appears before any [section] header")]
    ItemOutsideSection { line: usize, item: String },

    /// A `[]` header with no name
    #[error("line {line}: empty section name")]
    EmptySectionName { line: usize },
}

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, Error>;
