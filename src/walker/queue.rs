//! Bounded queues with backpressure and cancellation
//!
//! The pipeline connects its roles with two of these: producer → workers
//! (paths) and workers → aggregator (results). Senders block while the queue
//! is full; both blocking operations also wake when the run's
//! `CancelToken` fires. A queue is closed by dropping every sender.

use crate::content::Fingerprint;
use crate::walker::cancel::CancelToken;
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One hashed file travelling to the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedFile {
    /// Canonical mapping key
    pub key: String,

    /// Content fingerprint
    pub fingerprint: Fingerprint,

    /// Bytes digested
    pub bytes: u64,
}

/// Why a blocking queue operation returned without an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// The other side of the queue is gone
    Closed,

    /// The run was cancelled
    Cancelled,
}

/// Statistics for one queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total items enqueued
    pub enqueued: AtomicU64,

    /// Total items dequeued
    pub dequeued: AtomicU64,

    /// Number of sends that found the queue full
    pub backpressure_events: AtomicU64,
}

impl QueueStats {
    pub fn throughput(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    pub fn backpressure_count(&self) -> u64 {
        self.backpressure_events.load(Ordering::Relaxed)
    }
}

/// Bounded queue; hand out senders/receivers, then drop the queue itself
pub struct WorkQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    capacity: usize,
    stats: Arc<QueueStats>,
}

impl<T> WorkQueue<T> {
    /// Create a queue holding at most `capacity` items (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);

        Self {
            sender,
            receiver,
            capacity,
            stats: Arc::new(QueueStats::default()),
        }
    }

    pub fn sender(&self) -> QueueSender<T> {
        QueueSender {
            sender: self.sender.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    pub fn receiver(&self) -> QueueReceiver<T> {
        QueueReceiver {
            receiver: self.receiver.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Queue of discovered file paths
pub type PathQueue = WorkQueue<PathBuf>;

/// Queue of hashed files
pub type ResultQueue = WorkQueue<HashedFile>;

/// Sending half; the queue closes when the last one is dropped
pub struct QueueSender<T> {
    sender: Sender<T>,
    stats: Arc<QueueStats>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> QueueSender<T> {
    /// Send an item, blocking while the queue is full
    ///
    /// Returns `Interrupt::Cancelled` if the token fires while blocked and
    /// `Interrupt::Closed` if every receiver is gone.
    pub fn send(&self, item: T, cancel: &CancelToken) -> Result<(), Interrupt> {
        let item = match self.sender.try_send(item) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
            Err(TrySendError::Disconnected(_)) => return Err(Interrupt::Closed),
            Err(TrySendError::Full(item)) => {
                self.stats.backpressure_events.fetch_add(1, Ordering::Relaxed);
                item
            }
        };

        select! {
            send(self.sender, item) -> res => {
                res.map_err(|_| Interrupt::Closed)?;
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            recv(cancel.done()) -> _ => Err(Interrupt::Cancelled),
        }
    }
}

/// Receiving half
pub struct QueueReceiver<T> {
    receiver: Receiver<T>,
    stats: Arc<QueueStats>,
}

impl<T> Clone for QueueReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> QueueReceiver<T> {
    /// Receive an item, blocking while the queue is empty and open
    pub fn recv(&self, cancel: &CancelToken) -> Result<T, Interrupt> {
        if cancel.is_cancelled() {
            return Err(Interrupt::Cancelled);
        }

        select! {
            recv(self.receiver) -> msg => {
                let item = msg.map_err(|_| Interrupt::Closed)?;
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                Ok(item)
            }
            recv(cancel.done()) -> _ => Err(Interrupt::Cancelled),
        }
    }

    /// Receive until the queue is closed, ignoring cancellation
    pub fn recv_until_closed(&self) -> Option<T> {
        let item = self.receiver.recv().ok()?;
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}
