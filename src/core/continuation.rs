//! One-shot completion callbacks for asynchronous operations
//!
//! An [`AsyncContinuation`] is handed to every operation that completes
//! later (a queued write, a flush). It is invoked with `None` on success or
//! with the error that ended the operation.
//!
//! Handles are cheap to clone and all clones share one slot: the first
//! invocation delivers the outcome, every later invocation is ignored. A
//! continuation whose last handle is dropped without ever being invoked
//! fires with [`WrapperError::ContinuationDropped`].

use super::error::{AsyncError, WrapperError};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

type Callback = Box<dyn FnOnce(Option<AsyncError>) + Send + 'static>;

struct Slot {
    callback: Mutex<Option<Callback>>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.get_mut().take() {
            callback(Some(WrapperError::ContinuationDropped.shared()));
        }
    }
}

/// One-shot completion callback
///
/// # Example
///
/// ```
/// use async_target_wrapper::AsyncContinuation;
/// use std::sync::mpsc;
///
/// let (tx, rx) = mpsc::channel();
/// let continuation = AsyncContinuation::new(move |error| {
///     let _ = tx.send(error.is_none());
/// });
///
/// assert!(continuation.succeed());
/// // Later calls are ignored
/// assert!(!continuation.succeed());
/// assert_eq!(rx.recv().unwrap(), true);
/// ```
#[derive(Clone)]
pub struct AsyncContinuation {
    slot: Arc<Slot>,
}

impl AsyncContinuation {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Option<AsyncError>) + Send + 'static,
    {
        Self {
            slot: Arc::new(Slot {
                callback: Mutex::new(Some(Box::new(callback))),
            }),
        }
    }

    /// A continuation that ignores its outcome
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Deliver the outcome.
    ///
    /// Returns `true` if this call delivered it, `false` if the continuation
    /// had already fired.
    pub fn invoke(&self, error: Option<AsyncError>) -> bool {
        // Take under the lock, call outside it: callbacks may re-enter.
        let callback = self.slot.callback.lock().take();
        match callback {
            Some(callback) => {
                callback(error);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn succeed(&self) -> bool {
        self.invoke(None)
    }

    #[inline]
    pub fn fail(&self, error: WrapperError) -> bool {
        self.invoke(Some(error.shared()))
    }

    /// Whether the outcome has already been delivered
    pub fn is_completed(&self) -> bool {
        self.slot.callback.lock().is_none()
    }
}

impl fmt::Debug for AsyncContinuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncContinuation")
            .field("completed", &self.is_completed())
            .finish()
    }
}

/// Keeps the first error among a series of outcomes
#[derive(Debug, Default)]
pub struct FirstError {
    error: Option<AsyncError>,
}

impl FirstError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Option<AsyncError>) {
        if self.error.is_none() {
            self.error = outcome;
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn into_inner(self) -> Option<AsyncError> {
        self.error
    }
}
