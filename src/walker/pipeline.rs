//! Pipeline coordinator - orchestrates the concurrent hash run
//!
//! The coordinator is responsible for:
//! - Setting up the path and result queues (capacity = worker count)
//! - Starting the producer, the worker pool and the aggregator
//! - Joining every role and folding their outcomes into one result
//!
//! ```text
//!   producer ──paths──▶ worker 0..P ──results──▶ aggregator ──▶ FileHashes
//!       │                    │                       │
//!       └──────────── CancelToken (first error) ─────┘
//! ```
//!
//! The path queue closes when the producer returns; the result queue closes
//! when the last worker returns. The aggregator therefore drains every
//! result before it exits, and the mapping is only handed back after all
//! roles have been joined.

use crate::config::HashConfig;
use crate::content::{FileHasher, StreamHasher};
use crate::error::{Result, WalkerError, WorkerError};
use crate::hashes::FileHashes;
use crate::walker::cancel::CancelToken;
use crate::walker::queue::{HashedFile, Interrupt, PathQueue, QueueReceiver, QueueSender, ResultQueue};
use crate::walker::stats::RunStats;
use crate::walker::traverse::RegularFiles;
use crate::walker::worker::{join_role, spawn_role, HashWorker, PanicGuard};
use crate::walker::WalkResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Coordinates one concurrent hashing run
pub struct PipelineCoordinator<H = StreamHasher> {
    /// Root of the tree
    root: Arc<PathBuf>,

    /// Number of workers, also the capacity of both queues
    worker_count: usize,

    /// Prototype hasher, cloned once per worker
    hasher: H,

    /// Shared cancellation signal
    cancel: CancelToken,

    /// Shared counters
    stats: Arc<RunStats>,
}

impl PipelineCoordinator<StreamHasher> {
    /// MD5 pipeline with the default chunk size
    pub fn new(root: impl Into<PathBuf>, worker_count: usize) -> Self {
        Self::with_hasher(root, worker_count, StreamHasher::default())
    }

    /// Pipeline configured from validated settings
    pub fn from_config(config: &HashConfig) -> Self {
        Self::with_hasher(
            config.root.clone(),
            config.worker_count,
            StreamHasher::new(config.chunk_size),
        )
    }
}

impl<H> PipelineCoordinator<H>
where
    H: FileHasher + Clone + 'static,
{
    pub fn with_hasher(root: impl Into<PathBuf>, worker_count: usize, hasher: H) -> Self {
        Self {
            root: Arc::new(root.into()),
            worker_count: worker_count.max(1),
            hasher,
            cancel: CancelToken::new(),
            stats: Arc::new(RunStats::default()),
        }
    }

    /// Handle for cancelling the run from outside (signal handlers)
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Live counters for progress display
    pub fn stats(&self) -> Arc<RunStats> {
        Arc::clone(&self.stats)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Run the pipeline to completion
    ///
    /// Returns the full mapping, or the first error any role reported.
    pub fn run(self) -> Result<WalkResult> {
        let start = Instant::now();

        info!(
            root = %self.root.display(),
            workers = self.worker_count,
            "Starting concurrent hash run"
        );

        let path_queue = PathQueue::new(self.worker_count);
        let result_queue = ResultQueue::new(self.worker_count);

        let aggregator = self.spawn_aggregator(result_queue.receiver());
        let workers = self.spawn_workers(&path_queue, &result_queue);
        let producer = self.spawn_producer(path_queue.sender());

        // Only the roles may hold queue handles, or the queues never close
        drop(path_queue);
        drop(result_queue);

        let mut panicked: Option<WorkerError> = None;
        let mut record_panic = |err: WorkerError| {
            warn!(error = %err, "Pipeline role terminated abnormally");
            panicked.get_or_insert(err);
        };

        if let Some(handle) = producer {
            if let Err(e) = join_role("hash-producer", handle) {
                record_panic(e);
            }
        }

        for worker in workers {
            if let Err(e) = worker.join() {
                record_panic(e);
            }
        }

        let hashes = match aggregator {
            Some(handle) => match join_role("hash-aggregator", handle) {
                Ok(hashes) => Some(hashes),
                Err(e) => {
                    record_panic(e);
                    None
                }
            },
            None => None,
        };

        let duration = start.elapsed();

        if let Some(err) = self.cancel.take_error() {
            warn!(error = %err, duration_ms = duration.as_millis() as u64, "Concurrent hash run failed");
            return Err(err);
        }
        if let Some(err) = panicked {
            return Err(err.into());
        }
        if self.cancel.is_cancelled() {
            return Err(WalkerError::Cancelled);
        }
        let hashes = hashes.ok_or(WalkerError::Cancelled)?;

        let progress = self.stats.snapshot(duration);
        info!(
            files = progress.hashed,
            bytes = progress.bytes,
            skipped = progress.skipped,
            duration_ms = duration.as_millis() as u64,
            "Concurrent hash run completed"
        );

        Ok(WalkResult {
            hashes,
            total_files: progress.hashed,
            total_bytes: progress.bytes,
            skipped: progress.skipped,
            duration,
        })
    }

    /// Spawn the single result aggregator
    fn spawn_aggregator(&self, results: QueueReceiver<HashedFile>) -> Option<JoinHandle<FileHashes>> {
        self.spawn_or_fail("hash-aggregator", move || aggregate(results))
    }

    /// Spawn the worker pool
    ///
    /// A spawn failure cancels the run; workers already started unwind.
    fn spawn_workers(&self, paths: &PathQueue, results: &ResultQueue) -> Vec<HashWorker> {
        let mut workers = Vec::with_capacity(self.worker_count);

        for id in 0..self.worker_count {
            match HashWorker::spawn(
                id,
                Arc::clone(&self.root),
                self.hasher.clone(),
                paths.receiver(),
                results.sender(),
                self.cancel.clone(),
                Arc::clone(&self.stats),
            ) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    self.cancel.fail(e.into());
                    break;
                }
            }
        }

        debug!(count = workers.len(), "Workers spawned");
        workers
    }

    /// Spawn the single path producer
    fn spawn_producer(&self, paths: QueueSender<PathBuf>) -> Option<JoinHandle<()>> {
        let root = Arc::clone(&self.root);
        let cancel = self.cancel.clone();
        let stats = Arc::clone(&self.stats);

        self.spawn_or_fail("hash-producer", move || {
            let _guard = PanicGuard::new("hash-producer".into(), cancel.clone());

            match produce(&root, &paths, &cancel, stats) {
                Ok(count) => debug!(paths = count, "Producer exhausted the tree"),
                Err(e) if e.is_cancellation() => debug!("Producer cancelled"),
                Err(e) => {
                    warn!(error = %e, "Producer failed");
                    cancel.fail(e);
                }
            }
            // Dropping `paths` here closes the path queue
        })
    }

    fn spawn_or_fail<F, T>(&self, role: &str, f: F) -> Option<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        match spawn_role(role.to_string(), f) {
            Ok(handle) => Some(handle),
            Err(e) => {
                self.cancel.fail(e.into());
                None
            }
        }
    }
}

/// Walk the tree and feed every regular file to the workers
fn produce(
    root: &Path,
    paths: &QueueSender<PathBuf>,
    cancel: &CancelToken,
    stats: Arc<RunStats>,
) -> Result<u64> {
    let mut count = 0u64;

    for item in RegularFiles::new(root, stats) {
        if cancel.is_cancelled() {
            return Err(WalkerError::Cancelled);
        }

        let path = item?;
        match paths.send(path, cancel) {
            Ok(()) => count += 1,
            // Every worker is gone, which only happens once the run is failing
            Err(Interrupt::Closed) | Err(Interrupt::Cancelled) => {
                return Err(WalkerError::Cancelled)
            }
        }
    }

    Ok(count)
}

/// Drain the result queue into the mapping
fn aggregate(results: QueueReceiver<HashedFile>) -> FileHashes {
    let mut hashes = FileHashes::new();

    while let Some(item) = results.recv_until_closed() {
        if hashes.insert(item.key.clone(), item.fingerprint).is_some() {
            warn!(key = %item.key, "Duplicate path key; keeping latest fingerprint");
        }
    }

    debug!(entries = hashes.len(), "Aggregator drained result queue");
    hashes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Digested;
    use crate::error::{FileError, FileResult};
    use std::io;

    /// Hasher that fails on one file name and hashes everything else
    #[derive(Clone)]
    struct FailOn {
        name: &'static str,
        inner: StreamHasher,
    }

    impl FileHasher for FailOn {
        fn hash(&mut self, path: &Path) -> FileResult<Digested> {
            if path.file_name().is_some_and(|n| n == self.name) {
                return Err(FileError::Open {
                    path: path.to_path_buf(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                });
            }
            self.inner.hash(path)
        }
    }

    #[test]
    fn test_pipeline_hashes_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), "world").unwrap();

        let result = PipelineCoordinator::new(dir.path(), 2).run().unwrap();

        assert_eq!(result.hashes.len(), 2);
        assert_eq!(
            result.hashes.get("a.txt").unwrap().to_hex(),
            "5d41402abc4b2a76b9719d911017c592"
        );
        assert_eq!(
            result.hashes.get("sub/b.txt").unwrap().to_hex(),
            "7d793037a0760186574b0282f2f435e7"
        );
        assert_eq!(result.total_files, 2);
        assert_eq!(result.total_bytes, 10);
    }

    #[test]
    fn test_failure_surfaces_file_error() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..50 {
            std::fs::write(dir.path().join(format!("f{:02}.txt", i)), format!("{}", i)).unwrap();
        }

        let hasher = FailOn {
            name: "f17.txt",
            inner: StreamHasher::default(),
        };
        let err = PipelineCoordinator::with_hasher(dir.path(), 3, hasher)
            .run()
            .unwrap_err();

        match err {
            WalkerError::File(file_err) => {
                assert_eq!(file_err.path(), dir.path().join("f17.txt"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdir_fails_run() {
        use crate::error::TraversalError;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("hidden.txt"), "world").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through the mode bits
        if std::fs::read_dir(&locked).is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let outcome = PipelineCoordinator::new(dir.path(), 4).run();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        match outcome {
            Err(WalkerError::Traversal(TraversalError::PermissionDenied { path })) => {
                assert_eq!(path, locked);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_cancel_before_run() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();

        let coordinator = PipelineCoordinator::new(dir.path(), 2);
        coordinator.cancel_token().cancel();

        assert!(matches!(coordinator.run(), Err(WalkerError::Cancelled)));
    }

    #[test]
    fn test_zero_workers_means_one() {
        let coordinator = PipelineCoordinator::new(".", 0);
        assert_eq!(coordinator.worker_count(), 1);
    }
}
