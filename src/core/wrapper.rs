//! Async target wrapper
//!
//! Decouples producers from a slow target: events go into a bounded queue
//! and a dedicated worker thread writes them to the target in batches.
//! Every write carries an [`AsyncContinuation`] that is invoked exactly once
//! with the outcome.

use super::{
    config::AsyncWrapperConfig,
    continuation::AsyncContinuation,
    error::{AsyncError, Result, WrapperError},
    log_event::LogEvent,
    metrics::WrapperMetrics,
    overflow_action::{OverflowAction, OverflowCallback},
    queue::{BoundedQueue, EnqueueOutcome},
    target::Target,
    worker::{Command, PendingItem, Worker},
};
use crossbeam_channel::Sender;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

/// Default timeout for draining the queue when the wrapper is closed (5 seconds)
///
/// Used by [`AsyncTargetWrapper::close`] and when the wrapper is dropped.
/// Use [`AsyncTargetWrapper::close_with_timeout`] for a different value.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle of a wrapper: `Created → Running → Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WrapperState {
    Created,
    Running,
    Closed,
}

impl fmt::Display for WrapperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WrapperState::Created => write!(f, "Created"),
            WrapperState::Running => write!(f, "Running"),
            WrapperState::Closed => write!(f, "Closed"),
        }
    }
}

struct Lifecycle {
    state: WrapperState,
    /// Held until the worker takes ownership
    target: Option<Box<dyn Target>>,
    commands: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

/// Wraps a [`Target`] so producers never wait on its I/O
///
/// # Example
///
/// ```
/// use async_target_wrapper::prelude::*;
/// use std::sync::mpsc;
///
/// struct Stdout;
///
/// impl Target for Stdout {
///     fn name(&self) -> &str {
///         "stdout"
///     }
///
///     fn write(&mut self, event: &LogEvent) -> Result<()> {
///         println!("{} {}", event.level, event.message);
///         Ok(())
///     }
/// }
///
/// let wrapper = AsyncTargetWrapper::new(Stdout);
/// wrapper.initialize().unwrap();
///
/// let (tx, rx) = mpsc::channel();
/// wrapper.write_with(LogEvent::new(LogLevel::Info, "hello"), move |error| {
///     let _ = tx.send(error.is_none());
/// });
/// assert!(rx.recv().unwrap());
///
/// wrapper.close();
/// ```
pub struct AsyncTargetWrapper {
    name: String,
    config: AsyncWrapperConfig,
    queue: Arc<BoundedQueue<PendingItem>>,
    metrics: Arc<WrapperMetrics>,
    on_overflow: Option<OverflowCallback>,
    /// Hot-path copy of `lifecycle.state`
    state: RwLock<WrapperState>,
    /// Continuations run here; writes from it must never wait on the queue
    worker_thread: RwLock<Option<ThreadId>>,
    lifecycle: Mutex<Lifecycle>,
}

impl AsyncTargetWrapper {
    /// Wrap a target with the default configuration
    #[must_use]
    pub fn new(target: impl Target + 'static) -> Self {
        Self::with_config(target, AsyncWrapperConfig::default())
    }

    /// Wrap a target with a queue limit and overflow action, other settings default
    #[must_use]
    pub fn with_queue_limit(
        target: impl Target + 'static,
        queue_limit: usize,
        overflow_action: OverflowAction,
    ) -> Self {
        Self::with_config(target, AsyncWrapperConfig::new(queue_limit, overflow_action))
    }

    #[must_use]
    pub fn with_config(target: impl Target + 'static, config: AsyncWrapperConfig) -> Self {
        let target: Box<dyn Target> = Box::new(target);
        let name = target.name().to_string();
        Self::from_parts(name, target, config, None)
    }

    fn from_parts(
        name: String,
        target: Box<dyn Target>,
        config: AsyncWrapperConfig,
        on_overflow: Option<OverflowCallback>,
    ) -> Self {
        Self {
            name,
            queue: Arc::new(BoundedQueue::new(config.queue_limit, config.overflow_action)),
            config,
            metrics: Arc::new(WrapperMetrics::new()),
            on_overflow,
            state: RwLock::new(WrapperState::Created),
            worker_thread: RwLock::new(None),
            lifecycle: Mutex::new(Lifecycle {
                state: WrapperState::Created,
                target: Some(target),
                commands: None,
                worker: None,
            }),
        }
    }

    /// Create a builder for AsyncTargetWrapper
    #[must_use]
    pub fn builder() -> AsyncTargetWrapperBuilder {
        AsyncTargetWrapperBuilder::new()
    }

    /// Initialize the target and start the worker
    ///
    /// Calling it again while running is a no-op. A closed wrapper cannot be
    /// restarted.
    pub fn initialize(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            WrapperState::Running => return Ok(()),
            WrapperState::Closed => return Err(WrapperError::WrapperClosed),
            WrapperState::Created => {}
        }

        self.config.validate()?;

        let target = lifecycle.target.as_mut().ok_or_else(|| {
            WrapperError::other(format!("Target of '{}' is no longer available", self.name))
        })?;
        target.initialize()?;

        let target = lifecycle
            .target
            .take()
            .ok_or_else(|| WrapperError::other("target vanished during initialize"))?;
        let (commands_tx, commands_rx) = crossbeam_channel::unbounded();
        let worker = Worker::new(
            target,
            Arc::clone(&self.queue),
            commands_rx,
            Arc::clone(&self.metrics),
            self.config.batch_size,
            self.config.time_to_sleep_between_batches,
        );
        let handle = worker.spawn()?;

        *self.worker_thread.write() = Some(handle.thread().id());
        lifecycle.commands = Some(commands_tx);
        lifecycle.worker = Some(handle);
        lifecycle.state = WrapperState::Running;
        *self.state.write() = WrapperState::Running;
        Ok(())
    }

    /// Queue an event for the target
    ///
    /// Never panics and never returns an error: the outcome is delivered
    /// through `continuation`, exactly once. Normally it fires on the worker
    /// thread (or on the target's own thread for async targets). It fires
    /// immediately on the calling thread when the event is discarded (with
    /// no error) or when the wrapper is not running (with
    /// [`WrapperError::NotRunning`]).
    ///
    /// Blocks only under [`OverflowAction::Block`] while the queue is full.
    /// A write made from the worker thread itself, typically by a
    /// continuation that logs, never blocks: the queue grows past its limit
    /// instead, since only the worker can free space.
    pub fn write_log_event(&self, event: LogEvent, continuation: AsyncContinuation) {
        let state = *self.state.read();
        if state != WrapperState::Running {
            continuation.fail(WrapperError::NotRunning(state));
            return;
        }

        let item = PendingItem {
            event,
            continuation,
        };
        let outcome = if self.config.overflow_action == OverflowAction::Block
            && self.on_worker_thread()
        {
            self.queue.enqueue_without_waiting(item)
        } else {
            self.queue.enqueue(item)
        };

        match outcome {
            EnqueueOutcome::Enqueued => {
                self.metrics.record_enqueued();
            }
            EnqueueOutcome::Grew => {
                self.metrics.record_enqueued();
                self.metrics.record_grow();
            }
            EnqueueOutcome::EnqueuedAfterWait => {
                self.metrics.record_enqueued();
                self.metrics.record_block();
            }
            EnqueueOutcome::Discarded(item) => {
                self.alert_discard();
                item.continuation.succeed();
            }
            EnqueueOutcome::Closed(item) => {
                item.continuation.fail(WrapperError::WrapperClosed);
            }
        }
    }

    fn on_worker_thread(&self) -> bool {
        *self.worker_thread.read() == Some(thread::current().id())
    }

    /// Queue an event, ignoring its outcome
    #[inline]
    pub fn write(&self, event: LogEvent) {
        self.write_log_event(event, AsyncContinuation::noop());
    }

    /// Queue an event with a closure as continuation
    pub fn write_with<F>(&self, event: LogEvent, callback: F)
    where
        F: FnOnce(Option<AsyncError>) + Send + 'static,
    {
        self.write_log_event(event, AsyncContinuation::new(callback));
    }

    /// Count a discarded event and alert on the first and every 1000th
    fn alert_discard(&self) {
        let discarded = self.metrics.record_discarded();

        let should_alert = discarded == 0 || (discarded + 1) % 1000 == 0;
        if should_alert {
            eprintln!(
                "[ASYNC WRAPPER WARNING] '{}': {}, {} events discarded. \
                 Consider increasing queue_limit or using a different overflow action.",
                self.name,
                WrapperError::queue_full(self.queue.len(), self.config.queue_limit),
                discarded + 1
            );

            if let Some(ref callback) = self.on_overflow {
                callback(discarded + 1);
            }
        }
    }

    /// Drain the queued events, flush the target, then invoke `continuation`
    ///
    /// The continuation receives the first error among the drained events,
    /// else the target's flush error, else `None`. On a wrapper that was
    /// never initialized nothing can be queued and it completes at once.
    pub fn flush_async(&self, continuation: AsyncContinuation) {
        let lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            WrapperState::Created => {
                drop(lifecycle);
                continuation.succeed();
            }
            WrapperState::Closed => {
                drop(lifecycle);
                continuation.fail(WrapperError::NotRunning(WrapperState::Closed));
            }
            WrapperState::Running => {
                let handle = continuation.clone();
                let sent = lifecycle
                    .commands
                    .as_ref()
                    .map(|commands| commands.send(Command::Flush(continuation)).is_ok())
                    .unwrap_or(false);
                drop(lifecycle);
                if sent {
                    self.queue.wake_consumer();
                } else {
                    handle.fail(WrapperError::NotRunning(WrapperState::Closed));
                }
            }
        }
    }

    /// Blocking flush
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use async_target_wrapper::prelude::*;
    /// # fn demo(wrapper: &AsyncTargetWrapper) {
    /// use std::time::Duration;
    ///
    /// if let Err(e) = wrapper.flush(Duration::from_secs(1)) {
    ///     eprintln!("flush failed: {}", e);
    /// }
    /// # }
    /// ```
    pub fn flush(&self, timeout: Duration) -> std::result::Result<(), AsyncError> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.flush_async(AsyncContinuation::new(move |error| {
            let _ = tx.send(error);
        }));

        match rx.recv_timeout(timeout) {
            Ok(None) => Ok(()),
            Ok(Some(error)) => Err(error),
            Err(_) => Err(WrapperError::FlushTimeout {
                timeout_ms: timeout.as_millis(),
            }
            .shared()),
        }
    }

    /// Close with [`DEFAULT_SHUTDOWN_TIMEOUT`]
    pub fn close(&self) -> bool {
        self.close_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
    }

    /// Stop accepting events, drain the queue into the target and stop the worker
    ///
    /// Producers blocked on a full queue are released and their events fail
    /// with [`WrapperError::WrapperClosed`]. Events queued before the call
    /// are still written, then the target is flushed and closed.
    ///
    /// # Returns
    ///
    /// `true` if the worker finished within `timeout`, `false` otherwise
    pub fn close_with_timeout(&self, timeout: Duration) -> bool {
        let (commands, worker) = {
            let mut lifecycle = self.lifecycle.lock();
            let previous = lifecycle.state;
            if previous == WrapperState::Closed {
                return true;
            }

            lifecycle.state = WrapperState::Closed;
            *self.state.write() = WrapperState::Closed;
            self.queue.close();

            if previous == WrapperState::Created {
                // Never initialized: nothing queued, target never opened
                lifecycle.target = None;
                return true;
            }
            (lifecycle.commands.take(), lifecycle.worker.take())
        };

        if let Some(commands) = commands {
            let _ = commands.send(Command::Shutdown);
        }

        match worker {
            Some(handle) => Self::join_worker(handle, timeout),
            None => true,
        }
    }

    fn join_worker(handle: JoinHandle<()>, timeout: Duration) -> bool {
        // Closing from inside a continuation running on the worker itself
        if handle.thread().id() == thread::current().id() {
            return true;
        }

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!("[ASYNC WRAPPER ERROR] Worker thread panicked during close: {:?}", e);
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[ASYNC WRAPPER WARNING] Worker thread did not finish within {:?}. \
                     Some events may not have reached the target.",
                    timeout
                );
                return false;
            }

            // Small sleep to avoid busy-waiting
            thread::sleep(Duration::from_millis(10));
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> WrapperState {
        *self.state.read()
    }

    pub fn config(&self) -> &AsyncWrapperConfig {
        &self.config
    }

    pub fn queue_limit(&self) -> usize {
        self.config.queue_limit
    }

    pub fn overflow_action(&self) -> OverflowAction {
        self.config.overflow_action
    }

    pub fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    pub fn time_to_sleep_between_batches(&self) -> Duration {
        self.config.time_to_sleep_between_batches
    }

    /// Number of events currently waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of events dropped by the Discard overflow action
    pub fn discarded_count(&self) -> u64 {
        self.metrics.discarded_count()
    }

    /// Get the wrapper metrics for detailed observability
    ///
    /// # Example
    ///
    /// ```
    /// use async_target_wrapper::prelude::*;
    /// # struct Null;
    /// # impl Target for Null {
    /// #     fn name(&self) -> &str { "null" }
    /// #     fn write(&mut self, _: &LogEvent) -> Result<()> { Ok(()) }
    /// # }
    ///
    /// let wrapper = AsyncTargetWrapper::new(Null);
    ///
    /// let metrics = wrapper.metrics();
    /// println!("Discarded: {}", metrics.discarded_count());
    /// println!("Written: {}", metrics.written_count());
    /// println!("Discard rate: {:.2}%", metrics.discard_rate());
    /// ```
    pub fn metrics(&self) -> &WrapperMetrics {
        &self.metrics
    }
}

impl Drop for AsyncTargetWrapper {
    fn drop(&mut self) {
        self.close();

        let discarded = self.metrics.discarded_count();
        if discarded > 0 {
            eprintln!(
                "[ASYNC WRAPPER WARNING] '{}' closing with {} discarded events (discard rate: {:.2}%)",
                self.name,
                discarded,
                self.metrics.discard_rate()
            );
        }
    }
}

/// Builder for constructing AsyncTargetWrapper with a fluent API
///
/// # Example
/// ```
/// use async_target_wrapper::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
/// # struct Null;
/// # impl Target for Null {
/// #     fn name(&self) -> &str { "null" }
/// #     fn write(&mut self, _: &LogEvent) -> Result<()> { Ok(()) }
/// # }
///
/// let wrapper = AsyncTargetWrapper::builder()
///     .target(Null)
///     .queue_limit(500)
///     .overflow_action(OverflowAction::Discard)
///     .batch_size(50)
///     .time_to_sleep_between_batches(Duration::from_millis(10))
///     .on_overflow(Arc::new(|count| {
///         eprintln!("ALERT: {} events discarded", count);
///     }))
///     .build()
///     .unwrap();
///
/// assert_eq!(wrapper.queue_limit(), 500);
/// ```
pub struct AsyncTargetWrapperBuilder {
    name: Option<String>,
    target: Option<Box<dyn Target>>,
    config: AsyncWrapperConfig,
    on_overflow: Option<OverflowCallback>,
}

impl AsyncTargetWrapperBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            name: None,
            target: None,
            config: AsyncWrapperConfig::default(),
            on_overflow: None,
        }
    }

    /// Set the wrapped target (required)
    #[must_use = "builder methods return a new value"]
    pub fn target<T: Target + 'static>(mut self, target: T) -> Self {
        self.target = Some(Box::new(target));
        self
    }

    /// Name used in diagnostics; defaults to the target's name
    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the whole configuration
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: AsyncWrapperConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn queue_limit(mut self, queue_limit: usize) -> Self {
        self.config.queue_limit = queue_limit;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn overflow_action(mut self, action: OverflowAction) -> Self {
        self.config.overflow_action = action;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn time_to_sleep_between_batches(mut self, duration: Duration) -> Self {
        self.config.time_to_sleep_between_batches = duration;
        self
    }

    /// Set a callback for discard notifications
    ///
    /// Invoked on the first discarded event and every 1000th after, with the
    /// total discarded so far.
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    /// Build the wrapper, validating the configuration
    pub fn build(self) -> Result<AsyncTargetWrapper> {
        let target = self
            .target
            .ok_or_else(|| WrapperError::config("AsyncTargetWrapper", "a target is required"))?;
        self.config.validate()?;

        let name = self.name.unwrap_or_else(|| target.name().to_string());
        Ok(AsyncTargetWrapper::from_parts(
            name,
            target,
            self.config,
            self.on_overflow,
        ))
    }
}

impl Default for AsyncTargetWrapperBuilder {
    fn default() -> Self {
        Self::new()
    }
}
