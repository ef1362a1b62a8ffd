//! Error types for the staging pipeline.
//!
//! Every failure the pipeline can hit maps to one variant here. None of them
//! are recovered locally (apart from the bounded download retry inside the
//! HTTP source): the first error aborts the run before the cleanup step and
//! before the analysis handoff, leaving on-disk artifacts in place for
//! inspection.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, StageError>;

/// Failure kinds of the staging pipeline
#[derive(Error, Debug)]
pub enum StageError {
    /// Connection failure, timeout, or exhausted retries while downloading
    #[error("download failed for '{url}': {reason}")]
    Network { url: String, reason: String },

    /// The remote host answered, but not with the archive
    #[error("'{url}' returned HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Malformed ZIP, gzip, or tar data
    #[error("corrupt archive '{path}': {reason}")]
    CorruptArchive { path: PathBuf, reason: String },

    /// The outer archive does not contain the expected nested tarball
    #[error(
        "payload '{pattern}' not found in '{archive}' ({entries} entries scanned). \
         The upstream archive may have renamed its contents; pass --payload with the new name."
    )]
    PayloadNotFound {
        pattern: String,
        archive: PathBuf,
        entries: usize,
    },

    /// A wildcard payload pattern matched more than one entry
    #[error("payload pattern '{pattern}' is ambiguous: matches {matches:?}")]
    AmbiguousPayload {
        pattern: String,
        matches: Vec<String>,
    },

    /// The downloaded archive does not hash to the pinned digest
    #[error(
        "checksum mismatch for '{path}': expected {expected}, got {actual}. \
         The file was left on disk for inspection."
    )]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// The analysis script ran but exited nonzero
    #[error("analysis script '{script}' exited with {status}")]
    ScriptFailed { script: PathBuf, status: String },

    /// Filesystem read/write/permission failure
    #[error("file operation failed: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError {
    /// Create a network error
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a corrupt-archive error
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptArchive {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
