//! Exactly-once completion primitive
//!
//! [`AsyncOperation`] represents one outstanding call. Its completion is
//! observable three ways, all consistent with each other:
//!
//! - pull, async: [`AsyncOperation::wait`] suspends the calling task
//! - pull, blocking: [`AsyncOperation::wait_blocking`] parks an OS thread
//! - push: the optional callback given at creation
//!
//! Completion order is fixed: the slot moves Pending → Completed and the
//! callback is detached under one mutex, then both wait signals fire, then
//! the callback runs. A thread woken by the signal and a callback reading the
//! result see the same value; `close` waits for a running callback to return.

mod error;

pub use error::OperationError;

use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Caller-supplied state carried alongside an operation
pub type AsyncState = Arc<dyn Any + Send + Sync>;

/// Completion callback, invoked at most once on the completing thread
pub type OperationCallback<T> = Box<dyn FnOnce(&AsyncOperation<T>) + Send + 'static>;

/// Observable lifecycle of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Completed,
    Disposed,
}

enum Slot<T> {
    Pending,
    Completed(T),
    Disposed,
}

impl<T> Slot<T> {
    fn status(&self) -> OperationStatus {
        match self {
            Self::Pending => OperationStatus::Pending,
            Self::Completed(_) => OperationStatus::Completed,
            Self::Disposed => OperationStatus::Disposed,
        }
    }
}

/// Everything guarded by the operation mutex
struct Inner<T> {
    slot: Slot<T>,
    callback: Option<OperationCallback<T>>,
    state: Option<AsyncState>,
    /// Thread currently running the callback
    in_callback: Option<ThreadId>,
}

struct Shared<T> {
    inner: Mutex<Inner<T>>,
    /// Wakes `wait_blocking` callers and `close` waiting on a callback
    ready: Condvar,
    /// Flips to `true` once the slot leaves `Pending`; wakes async waiters
    settled: watch::Sender<bool>,
}

/// Clears `in_callback` even if the callback panics
struct CallbackRun<'a, T> {
    shared: &'a Shared<T>,
}

impl<T> Drop for CallbackRun<'_, T> {
    fn drop(&mut self) {
        self.shared.inner.lock().in_callback = None;
        self.shared.ready.notify_all();
    }
}

/// Handle to a pending unit of work with exactly-once completion
///
/// Cloning yields another handle to the same operation. The owner releases
/// it deterministically with [`close`](Self::close); dropping the last
/// handle frees everything as well.
pub struct AsyncOperation<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for AsyncOperation<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> AsyncOperation<T>
where
    T: Clone + Send + 'static,
{
    /// Allocate a pending operation with an optional callback and state
    pub fn create(callback: Option<OperationCallback<T>>, state: Option<AsyncState>) -> Self {
        let (settled, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    slot: Slot::Pending,
                    callback,
                    state,
                    in_callback: None,
                }),
                ready: Condvar::new(),
                settled,
            }),
        }
    }

    /// Pending operation without callback or state
    pub fn new() -> Self {
        Self::create(None, None)
    }

    /// Pending operation that runs `callback` once it completes
    pub fn with_callback<F>(callback: F, state: Option<AsyncState>) -> Self
    where
        F: FnOnce(&AsyncOperation<T>) + Send + 'static,
    {
        Self::create(Some(Box::new(callback)), state)
    }

    /// Complete the operation with `result`
    ///
    /// Only the first caller wins. Every later call, concurrent or not, is
    /// rejected with [`OperationError::AlreadyCompleted`] and changes nothing:
    /// the stored result stays and the callback is not invoked again.
    pub fn complete(&self, result: T) -> Result<(), OperationError> {
        let callback = {
            let mut inner = self.shared.inner.lock();
            match inner.slot {
                Slot::Pending => inner.slot = Slot::Completed(result),
                Slot::Completed(_) => return Err(OperationError::AlreadyCompleted),
                Slot::Disposed => return Err(OperationError::Disposed),
            }
            let callback = inner.callback.take();
            if callback.is_some() {
                inner.in_callback = Some(thread::current().id());
            }
            callback
        };

        self.shared.ready.notify_all();
        self.shared.settled.send_replace(true);

        if let Some(callback) = callback {
            let _run = CallbackRun {
                shared: &self.shared,
            };
            callback(self);
        }

        Ok(())
    }

    /// Wait for completion, suspending the calling task
    ///
    /// `None` waits indefinitely. A timeout yields [`OperationError::TimedOut`]
    /// and leaves the operation untouched; a later `wait` still observes the
    /// result once it arrives.
    pub async fn wait(&self, timeout: Option<Duration>) -> Result<T, OperationError> {
        let mut settled = self.shared.settled.subscribe();
        let signal = settled.wait_for(|done| *done);

        match timeout {
            // The sender lives in `shared`, which `self` keeps alive.
            None => drop(signal.await),
            Some(limit) => {
                if tokio::time::timeout(limit, signal).await.is_err() {
                    return Err(OperationError::TimedOut(limit));
                }
            }
        }

        self.settled_result()
    }

    /// Wait for completion, blocking the calling thread
    ///
    /// For callers outside the async runtime. Must not be called from a
    /// runtime worker thread. A timeout too large to form a deadline waits
    /// indefinitely.
    pub fn wait_blocking(&self, timeout: Option<Duration>) -> Result<T, OperationError> {
        let mut inner = self.shared.inner.lock();
        let deadline =
            timeout.and_then(|limit| Instant::now().checked_add(limit).map(|at| (at, limit)));

        loop {
            match &inner.slot {
                Slot::Completed(result) => return Ok(result.clone()),
                Slot::Disposed => return Err(OperationError::Disposed),
                Slot::Pending => {}
            }

            match deadline {
                None => self.shared.ready.wait(&mut inner),
                Some((at, limit)) => {
                    if self.shared.ready.wait_until(&mut inner, at).timed_out()
                        && matches!(inner.slot, Slot::Pending)
                    {
                        return Err(OperationError::TimedOut(limit));
                    }
                }
            }
        }
    }

    /// Non-blocking poll
    pub fn is_completed(&self) -> bool {
        matches!(self.shared.inner.lock().slot, Slot::Completed(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.shared.inner.lock().slot, Slot::Disposed)
    }

    pub fn status(&self) -> OperationStatus {
        self.shared.inner.lock().slot.status()
    }

    /// Result if already completed, without waiting
    pub fn try_result(&self) -> Result<Option<T>, OperationError> {
        match &self.shared.inner.lock().slot {
            Slot::Pending => Ok(None),
            Slot::Completed(result) => Ok(Some(result.clone())),
            Slot::Disposed => Err(OperationError::Disposed),
        }
    }

    /// State supplied at creation
    pub fn async_state(&self) -> Result<Option<AsyncState>, OperationError> {
        let inner = self.shared.inner.lock();
        if matches!(inner.slot, Slot::Disposed) {
            return Err(OperationError::Disposed);
        }
        Ok(inner.state.clone())
    }

    /// Release the operation
    ///
    /// Detaches callback, state and result. Waiters still pending wake with
    /// [`OperationError::Disposed`], as does every later call. Idempotent.
    ///
    /// A callback already running on another thread is allowed to finish
    /// first; closing from inside the callback does not wait.
    pub fn close(&self) {
        let (previous, callback, state) = {
            let mut inner = self.shared.inner.lock();
            let current = thread::current().id();
            while inner.in_callback.is_some_and(|runner| runner != current) {
                self.shared.ready.wait(&mut inner);
            }
            if matches!(inner.slot, Slot::Disposed) {
                return;
            }
            (
                std::mem::replace(&mut inner.slot, Slot::Disposed),
                inner.callback.take(),
                inner.state.take(),
            )
        };

        self.shared.ready.notify_all();
        self.shared.settled.send_replace(true);

        drop((previous, callback, state));
    }

    fn settled_result(&self) -> Result<T, OperationError> {
        match &self.shared.inner.lock().slot {
            Slot::Completed(result) => Ok(result.clone()),
            Slot::Disposed => Err(OperationError::Disposed),
            // `settled` only flips after the slot has left `Pending`.
            Slot::Pending => Err(OperationError::Disposed),
        }
    }
}

impl<T> Default for AsyncOperation<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AsyncOperation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("AsyncOperation")
            .field("status", &inner.slot.status())
            .field("has_callback", &inner.callback.is_some())
            .finish_non_exhaustive()
    }
}
