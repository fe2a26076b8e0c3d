//! Single-threaded baseline walker
//!
//! Traverses the tree depth-first on the calling thread and hashes each
//! regular file as it is found, with one reusable hasher. This is the
//! reference the concurrent pipeline is validated against.

use crate::config::HashConfig;
use crate::content::{FileHasher, StreamHasher};
use crate::error::{Result, WalkerError};
use crate::hashes::{canonical_key, FileHashes};
use crate::walker::cancel::CancelToken;
use crate::walker::stats::RunStats;
use crate::walker::traverse::RegularFiles;
use crate::walker::WalkResult;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, trace, warn};

/// Sequential hash run over one tree
pub struct SequentialWalker<H = StreamHasher> {
    root: PathBuf,
    hasher: H,
    cancel: CancelToken,
    stats: Arc<RunStats>,
}

impl SequentialWalker<StreamHasher> {
    /// MD5 walker with the default chunk size
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_hasher(root, StreamHasher::default())
    }

    /// Walker configured from validated settings
    pub fn from_config(config: &HashConfig) -> Self {
        Self::with_hasher(config.root.clone(), StreamHasher::new(config.chunk_size))
    }
}

impl<H: FileHasher> SequentialWalker<H> {
    pub fn with_hasher(root: impl Into<PathBuf>, hasher: H) -> Self {
        Self {
            root: root.into(),
            hasher,
            cancel: CancelToken::new(),
            stats: Arc::new(RunStats::default()),
        }
    }

    /// Handle for cancelling the walk from outside (signal handlers)
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Live counters for progress display
    pub fn stats(&self) -> Arc<RunStats> {
        Arc::clone(&self.stats)
    }

    /// Walk and hash the whole tree
    ///
    /// The first traversal or hashing error aborts the walk; no partial
    /// mapping is returned.
    pub fn run(mut self) -> Result<WalkResult> {
        let start = Instant::now();
        info!(root = %self.root.display(), "Starting sequential hash run");

        let hashes = match self.hash_all() {
            Ok(hashes) => hashes,
            Err(e) => {
                warn!(error = %e, "Sequential hash run failed");
                return Err(e);
            }
        };

        let duration = start.elapsed();
        let progress = self.stats.snapshot(duration);
        info!(
            files = progress.hashed,
            bytes = progress.bytes,
            skipped = progress.skipped,
            duration_ms = duration.as_millis() as u64,
            "Sequential hash run completed"
        );

        Ok(WalkResult {
            hashes,
            total_files: progress.hashed,
            total_bytes: progress.bytes,
            skipped: progress.skipped,
            duration,
        })
    }

    fn hash_all(&mut self) -> Result<FileHashes> {
        let mut hashes = FileHashes::new();

        for item in RegularFiles::new(&self.root, Arc::clone(&self.stats)) {
            if self.cancel.is_cancelled() {
                return Err(self.cancel.outcome_error());
            }

            let path = item.map_err(WalkerError::from)?;
            let digested = self.hasher.hash(&path)?;
            self.stats.record_hashed(digested.bytes);

            let key = canonical_key(&self.root, &path);
            trace!(key = %key, fingerprint = %digested.fingerprint, "File hashed");
            hashes.insert(key, digested.fingerprint);
        }

        Ok(hashes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TraversalError;

    #[test]
    fn test_sequential_hashes_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), "world").unwrap();

        let result = SequentialWalker::new(dir.path()).run().unwrap();

        assert_eq!(result.hashes.len(), 2);
        assert_eq!(
            result.hashes.get("a.txt").unwrap().to_hex(),
            "5d41402abc4b2a76b9719d911017c592"
        );
        assert_eq!(
            result.hashes.get("sub/b.txt").unwrap().to_hex(),
            "7d793037a0760186574b0282f2f435e7"
        );
        assert_eq!(result.total_bytes, 10);
    }

    #[test]
    fn test_single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("only.txt");
        std::fs::write(&file, "hello").unwrap();

        let result = SequentialWalker::new(&file).run().unwrap();
        assert_eq!(result.hashes.len(), 1);
        assert!(result.hashes.get("only.txt").is_some());
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = SequentialWalker::new(dir.path().join("missing"))
            .run()
            .unwrap_err();

        assert!(matches!(
            err,
            WalkerError::Traversal(TraversalError::RootNotFound { .. })
        ));
    }

    #[test]
    fn test_cancelled_walk_returns_no_mapping() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();

        let walker = SequentialWalker::new(dir.path());
        walker.cancel_token().fail(WalkerError::Interrupted);

        assert!(matches!(walker.run(), Err(WalkerError::Interrupted)));
    }
}
