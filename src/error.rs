//! Error types for tree-hasher
//!
//! This module defines the error hierarchy for a hashing run:
//! - Traversal errors (the tree could not be walked)
//! - File errors (one file could not be opened or fully read)
//! - Cancellation (a role unwound after another role failed)
//! - Configuration, worker thread and output errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors carry the path they concern
//! - Any error fails the whole run; nothing here is retried

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for a hashing run
#[derive(Error, Debug)]
pub enum WalkerError {
    /// The tree could not be walked
    #[error("Traversal error: {0}")]
    Traversal(#[from] TraversalError),

    /// A file could not be hashed
    #[error("I/O error: {0}")]
    File(#[from] FileError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker thread errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Artifact read/write errors
    #[error("Output error: {0}")]
    Sink(#[from] SinkError),

    /// A role observed the cancellation signal and stopped
    #[error("Run cancelled before completion")]
    Cancelled,

    /// Interrupted by signal
    #[error("Operation interrupted by signal")]
    Interrupted,

    /// The two strategies disagree
    #[error(
        "Result mappings differ: {only_left} only in first, {only_right} only in second, {mismatched} with different fingerprints"
    )]
    Mismatch {
        only_left: usize,
        only_right: usize,
        mismatched: usize,
    },
}

impl WalkerError {
    /// True for the voluntary-unwind variant
    pub fn is_cancellation(&self) -> bool {
        matches!(self, WalkerError::Cancelled)
    }
}

/// The filesystem could not be walked
#[derive(Error, Debug)]
pub enum TraversalError {
    /// Root path does not exist
    #[error("Root path not found: '{path}'")]
    RootNotFound { path: PathBuf },

    /// Permission denied on a directory
    #[error("Permission denied: '{path}'")]
    PermissionDenied { path: PathBuf },

    /// Reading a directory entry failed
    #[error("Failed to read directory '{path}': {reason}")]
    ReadDir { path: PathBuf, reason: String },

    /// Filesystem loop (only reachable when links are followed)
    #[error("Filesystem loop at '{path}' back to '{ancestor}'")]
    Loop { path: PathBuf, ancestor: PathBuf },
}

impl TraversalError {
    /// Classify a walkdir error
    ///
    /// `root` is used for errors at depth 0 and for errors without a path.
    pub fn from_walkdir(root: &std::path::Path, err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| root.to_path_buf());

        if let Some(ancestor) = err.loop_ancestor() {
            return TraversalError::Loop {
                path,
                ancestor: ancestor.to_path_buf(),
            };
        }

        match err.io_error().map(|e| e.kind()) {
            Some(io::ErrorKind::NotFound) if err.depth() == 0 => {
                TraversalError::RootNotFound { path }
            }
            Some(io::ErrorKind::PermissionDenied) => TraversalError::PermissionDenied { path },
            _ => TraversalError::ReadDir {
                path,
                reason: err.to_string(),
            },
        }
    }
}

/// A specific file could not be opened or fully read
#[derive(Error, Debug)]
pub enum FileError {
    /// Open failed
    #[error("Failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A read failed mid-stream
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    /// Path of the file that failed
    pub fn path(&self) -> &std::path::Path {
        match self {
            FileError::Open { path, .. } => path,
            FileError::Read { path, .. } => path,
        }
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid chunk size
    #[error("Invalid chunk size {size}: must be between 1 and {max}")]
    InvalidChunkSize { size: usize, max: usize },

    /// Root path is empty
    #[error("Root path must not be empty")]
    EmptyRoot,

    /// Output path error
    #[error("Invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Thread could not be spawned
    #[error("Failed to spawn {role}: {reason}")]
    SpawnFailed { role: String, reason: String },

    /// Thread panicked
    #[error("{role} panicked: {message}")]
    Panicked { role: String, message: String },
}

/// Artifact read/write errors
#[derive(Error, Debug)]
pub enum SinkError {
    /// File operation failed
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON encode/decode failed
    #[error("JSON error in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Temp file could not be moved into place
    #[error("Failed to persist '{path}': {reason}")]
    Persist { path: PathBuf, reason: String },
}

/// Result type alias for WalkerError
pub type Result<T> = std::result::Result<T, WalkerError>;

/// Result type alias for FileError
pub type FileResult<T> = std::result::Result<T, FileError>;

/// Result type alias for SinkError
pub type SinkResult<T> = std::result::Result<T, SinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_is_root_not_found() {
        let missing = std::env::temp_dir().join("tree-hasher-definitely-missing-root");
        let err = walkdir::WalkDir::new(&missing)
            .into_iter()
            .find_map(|e| e.err())
            .unwrap();

        let traversal = TraversalError::from_walkdir(&missing, err);
        assert!(matches!(traversal, TraversalError::RootNotFound { ref path } if *path == missing));
    }

    #[cfg(unix)]
    #[test]
    fn test_loop_below_root_is_classified() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::os::unix::fs::symlink(dir.path(), sub.join("back")).unwrap();

        let err = walkdir::WalkDir::new(dir.path())
            .follow_links(true)
            .into_iter()
            .find_map(|e| e.err())
            .unwrap();
        assert!(err.depth() > 0);

        let traversal = TraversalError::from_walkdir(dir.path(), err);
        assert!(matches!(
            traversal,
            TraversalError::Loop { ref path, ref ancestor }
                if *path == sub.join("back") && *ancestor == dir.path()
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdir_is_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through the mode bits
        if std::fs::read_dir(&locked).is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let err = walkdir::WalkDir::new(dir.path())
            .into_iter()
            .find_map(|e| e.err())
            .unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(err.depth(), 1);

        let traversal = TraversalError::from_walkdir(dir.path(), err);
        assert!(matches!(
            traversal,
            TraversalError::PermissionDenied { ref path } if *path == locked
        ));
    }

    #[test]
    fn test_error_conversion() {
        let file_err = FileError::Open {
            path: "/missing".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(file_err.path(), std::path::Path::new("/missing"));

        let walker_err: WalkerError = file_err.into();
        assert!(matches!(walker_err, WalkerError::File(_)));
        assert!(!walker_err.is_cancellation());
        assert!(WalkerError::Cancelled.is_cancellation());
    }
}
