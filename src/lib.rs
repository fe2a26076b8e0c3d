//! tree-hasher - Parallel content fingerprinting of directory trees
//!
//! Computes the MD5 of every regular file under a root directory and
//! persists the path → fingerprint mapping as JSON. Two strategies produce
//! the same mapping:
//!
//! - **Sequential**: one thread walks the tree and hashes as it goes. This
//!   is the correctness baseline.
//!
//! - **Concurrent pipeline**: a single producer walks the tree, a fixed pool
//!   of workers hashes files, and a single aggregator builds the mapping.
//!   Roles are connected by bounded queues sized to the worker count, so
//!   memory stays flat however large the tree is.
//!
//! Any failure in any role cancels the whole pipeline; the caller gets
//! either the complete mapping or the first error, never a partial result.
//!
//! # Example
//!
//! ```no_run
//! use tree_hasher::walker::{hash_tree_parallel, hash_tree_sequential};
//!
//! let baseline = hash_tree_sequential("./src")?;
//! let parallel = hash_tree_parallel("./src", 8)?;
//! assert!(baseline.diff(&parallel).is_empty());
//! # Ok::<(), tree_hasher::WalkerError>(())
//! ```
//!
//! ```bash
//! tree-hasher --root ~/src -w 8
//! tree-hasher compare result_single.json result_parallels.json
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod hashes;
pub mod output;
pub mod progress;
pub mod walker;

pub use config::{CliArgs, HashConfig, HashMode};
pub use content::{Fingerprint, StreamHasher};
pub use error::{Result, WalkerError};
pub use hashes::{FileHashes, HashDiff};
pub use walker::{PipelineCoordinator, SequentialWalker, WalkResult};
