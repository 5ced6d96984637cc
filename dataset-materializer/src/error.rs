//! Error types for dataset-materializer
//!
//! Failures split by blast radius:
//! - [`MaterializeError::Precondition`] and [`MaterializeError::Config`] stop a
//!   run before any file is touched
//! - [`MoveError`] and serialization failures affect a single file
//! - [`MaterializeError::MetadataLog`] stops the run mid-way

use std::path::PathBuf;
use thiserror::Error;

/// Run-level error
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// Source directory missing, not a directory, or unreadable
    #[error("Precondition failed for {path}: {reason}")]
    Precondition { path: PathBuf, reason: String },

    /// Configuration could not be resolved or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Target directory layout could not be created
    #[error("Failed to prepare {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata log could not be opened or written
    #[error("Metadata log error ({path}): {source}")]
    MetadataLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line of an existing metadata log is not a valid record
    #[error("Malformed record on line {line} of {path}: {source}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Record failed to encode as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// dataset-common error
    #[error(transparent)]
    Common(#[from] dataset_common::Error),
}

/// Per-file relocation failure
#[derive(Debug, Error)]
pub enum MoveError {
    /// Destination name already taken; existing files are never overwritten
    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// Copy fallback succeeded but the source could not be removed
    #[error("Copied to {dest} but could not remove source {src}: {source}")]
    SourceNotRemoved {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rename and copy both failed
    #[error("Failed to move {src} -> {dest}: {source}")]
    Io {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for materializer operations
pub type Result<T> = std::result::Result<T, MaterializeError>;
