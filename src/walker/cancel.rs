//! Shared cancellation signal for a hashing run
//!
//! A `CancelToken` combines three things:
//! - an atomic flag for cheap polling between work items
//! - a "done" channel whose only sender is dropped on cancel, so any
//!   `select!` waiting on `done()` wakes immediately
//! - a first-error slot; the first error recorded wins
//!
//! Roles that merely observe cancellation unwind without recording anything,
//! so the slot only ever holds the error that caused the shutdown.

use crate::error::WalkerError;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

struct CancelInner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
    first_error: Mutex<Option<WalkerError>>,
}

/// Cloneable handle to one run's cancellation state
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (trigger, done) = bounded(0);

        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                done,
                first_error: Mutex::new(None),
            }),
        }
    }

    /// Check whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Channel that becomes ready (disconnected) once cancelled
    ///
    /// Nothing is ever sent on it; use it as a `select!` arm.
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }

    /// Request cancellation without recording an error
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            debug!("Cancellation requested");
        }
        // Dropping the sender disconnects `done` for every waiter
        self.inner.trigger.lock().take();
    }

    /// Record `err` if it is the first error, then cancel
    ///
    /// Returns true when this call's error was kept. Cancellation errors are
    /// never recorded; they are the consequence, not the cause.
    pub fn fail(&self, err: WalkerError) -> bool {
        let kept = if err.is_cancellation() {
            false
        } else {
            let mut slot = self.inner.first_error.lock();
            if slot.is_none() {
                debug!(error = %err, "Recording first error");
                *slot = Some(err);
                true
            } else {
                false
            }
        };

        self.cancel();
        kept
    }

    /// Take the recorded error, if any
    pub fn take_error(&self) -> Option<WalkerError> {
        self.inner.first_error.lock().take()
    }

    /// Outcome to report for a run that did not complete cleanly
    pub fn outcome_error(&self) -> WalkerError {
        self.take_error().unwrap_or(WalkerError::Cancelled)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::select;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_first_error_wins() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        assert!(token.fail(WalkerError::Interrupted));
        assert!(!token.fail(WalkerError::Config(crate::error::ConfigError::EmptyRoot)));
        assert!(token.is_cancelled());

        assert!(matches!(token.take_error(), Some(WalkerError::Interrupted)));
        assert!(token.take_error().is_none());
    }

    #[test]
    fn test_cancellation_error_is_not_recorded() {
        let token = CancelToken::new();
        assert!(!token.fail(WalkerError::Cancelled));
        assert!(token.is_cancelled());
        assert!(matches!(token.outcome_error(), WalkerError::Cancelled));
    }

    #[test]
    fn test_done_wakes_blocked_select() {
        let token = CancelToken::new();
        let (_tx, rx) = bounded::<u32>(1);

        let waiter = {
            let token = token.clone();
            thread::spawn(move || {
                select! {
                    recv(rx) -> _ => false,
                    recv(token.done()) -> _ => true,
                }
            })
        };

        thread::sleep(Duration::from_millis(20));
        token.cancel();
        assert!(waiter.join().unwrap());

        // Repeated cancel is harmless
        token.cancel();
        assert!(token.done().recv().is_err());
    }
}
