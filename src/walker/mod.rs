//! Tree hashing strategies
//!
//! Two interchangeable ways to produce a `FileHashes` mapping:
//!
//! - `SequentialWalker`: one thread walks and hashes (the baseline)
//! - `PipelineCoordinator`: a producer, a fixed worker pool and an
//!   aggregator connected by bounded queues
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │      Path Producer      │
//!                     │   depth-first walkdir   │
//!                     └───────────┬─────────────┘
//!                                 │ bounded(P) paths
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Worker 1 │             │  Worker 2 │             │  Worker P │
//! │  MD5      │             │  MD5      │             │  MD5      │
//! └─────┬─────┘             └─────┬─────┘             └─────┬─────┘
//!       └─────────────────────────┼─────────────────────────┘
//!                                 │ bounded(P) results
//!                     ┌───────────▼─────────────┐
//!                     │    Result Aggregator    │
//!                     └─────────────────────────┘
//! ```

pub mod cancel;
pub mod pipeline;
pub mod queue;
pub mod sequential;
pub mod stats;
pub mod traverse;
pub mod worker;

pub use cancel::CancelToken;
pub use pipeline::PipelineCoordinator;
pub use sequential::SequentialWalker;
pub use stats::{HashProgress, RunStats};

use crate::error::Result;
use crate::hashes::FileHashes;
use std::path::PathBuf;
use std::time::Duration;

/// Result of a completed hash run
#[derive(Debug, Clone)]
pub struct WalkResult {
    /// One entry per hashed file
    pub hashes: FileHashes,

    /// Files hashed
    pub total_files: u64,

    /// Bytes digested
    pub total_bytes: u64,

    /// Non-regular entries skipped
    pub skipped: u64,

    /// Time taken for the run
    pub duration: Duration,
}

/// Hash every regular file under `root` on the calling thread
pub fn hash_tree_sequential(root: impl Into<PathBuf>) -> Result<FileHashes> {
    SequentialWalker::new(root).run().map(|r| r.hashes)
}

/// Hash every regular file under `root` with `workers` hashing threads
pub fn hash_tree_parallel(root: impl Into<PathBuf>, workers: usize) -> Result<FileHashes> {
    PipelineCoordinator::new(root, workers).run().map(|r| r.hashes)
}
