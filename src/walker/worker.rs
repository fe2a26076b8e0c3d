//! Hashing worker threads
//!
//! Each worker:
//! - Owns a private `FileHasher` (its own digest and read buffer)
//! - Pulls paths from the path queue until it closes or the run is cancelled
//! - Pushes one `HashedFile` per path onto the result queue
//! - Records its first hashing error in the shared `CancelToken` and exits

use crate::content::FileHasher;
use crate::error::{Result, WalkerError, WorkerError};
use crate::hashes::canonical_key;
use crate::walker::cancel::CancelToken;
use crate::walker::queue::{HashedFile, Interrupt, QueueReceiver, QueueSender};
use crate::walker::stats::RunStats;
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// A worker thread that hashes files
pub struct HashWorker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,
}

impl HashWorker {
    /// Spawn a new worker thread
    pub fn spawn<H>(
        id: usize,
        root: Arc<PathBuf>,
        hasher: H,
        paths: QueueReceiver<PathBuf>,
        results: QueueSender<HashedFile>,
        cancel: CancelToken,
        stats: Arc<RunStats>,
    ) -> std::result::Result<Self, WorkerError>
    where
        H: FileHasher + 'static,
    {
        let role = format!("hash-worker-{}", id);

        let handle = spawn_role(role.clone(), move || {
            let _guard = PanicGuard::new(role, cancel.clone());

            match worker_loop(id, &root, hasher, &paths, &results, &cancel, &stats) {
                Ok(()) => debug!(worker = id, "Worker finished"),
                Err(e) if e.is_cancellation() => debug!(worker = id, "Worker cancelled"),
                Err(e) => {
                    warn!(worker = id, error = %e, "Worker failed");
                    cancel.fail(e);
                }
            }
        })?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> std::result::Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => join_role(&format!("hash-worker-{}", self.id), handle),
            None => Ok(()),
        }
    }
}

/// Main worker loop
fn worker_loop<H: FileHasher>(
    id: usize,
    root: &Path,
    mut hasher: H,
    paths: &QueueReceiver<PathBuf>,
    results: &QueueSender<HashedFile>,
    cancel: &CancelToken,
    stats: &RunStats,
) -> Result<()> {
    loop {
        let path = match paths.recv(cancel) {
            Ok(path) => path,
            Err(Interrupt::Closed) => return Ok(()),
            Err(Interrupt::Cancelled) => return Err(WalkerError::Cancelled),
        };

        let digested = hasher.hash(&path)?;
        stats.record_hashed(digested.bytes);

        let item = HashedFile {
            key: canonical_key(root, &path),
            fingerprint: digested.fingerprint,
            bytes: digested.bytes,
        };
        trace!(worker = id, key = %item.key, fingerprint = %item.fingerprint, "File hashed");

        // A closed result queue means the aggregator is gone; its join reports why
        results
            .send(item, cancel)
            .map_err(|_| WalkerError::Cancelled)?;
    }
}

/// Spawn a named thread for one pipeline role
pub(crate) fn spawn_role<F, T>(role: String, f: F) -> std::result::Result<JoinHandle<T>, WorkerError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(role.clone())
        .spawn(f)
        .map_err(|e| WorkerError::SpawnFailed {
            role,
            reason: e.to_string(),
        })
}

/// Join a role's thread, turning a panic into a `WorkerError`
pub(crate) fn join_role<T>(role: &str, handle: JoinHandle<T>) -> std::result::Result<T, WorkerError> {
    handle.join().map_err(|payload| WorkerError::Panicked {
        role: role.to_string(),
        message: panic_message(payload.as_ref()),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Cancels the run if the owning thread unwinds from a panic
pub(crate) struct PanicGuard {
    role: String,
    cancel: CancelToken,
}

impl PanicGuard {
    pub(crate) fn new(role: String, cancel: CancelToken) -> Self {
        Self { role, cancel }
    }
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            self.cancel.fail(
                WorkerError::Panicked {
                    role: self.role.clone(),
                    message: "thread panicked".into(),
                }
                .into(),
            );
        }
    }
}
