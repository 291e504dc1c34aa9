//! Background worker draining the queue into the target
//!
//! The worker is the only code that touches the target after the wrapper is
//! initialized. Each cycle it takes up to `batch_size` events, dispatches
//! them without waiting on each one, then waits until every event of the
//! batch has been acknowledged. A batch without errors is followed by a
//! target flush; a batch with at least one error is not.
//!
//! With a zero idle interval the worker does not poll: it parks on the queue
//! until an event is enqueued or the wrapper wakes it for a command.
//!
//! **Panic isolation**: every call into the target is wrapped in
//! `catch_unwind`. A panicking target fails the affected continuation
//! instead of killing the worker.

use super::continuation::{AsyncContinuation, FirstError};
use super::error::{AsyncError, Result, WrapperError};
use super::log_event::LogEvent;
use super::metrics::WrapperMetrics;
use super::queue::BoundedQueue;
use super::target::Target;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Upper bound of one park when the idle interval is zero
const MAX_PARK: Duration = Duration::from_secs(1);

/// A queued event together with the producer's continuation
pub(crate) struct PendingItem {
    pub(crate) event: LogEvent,
    pub(crate) continuation: AsyncContinuation,
}

/// Requests sent from the wrapper to its worker
pub(crate) enum Command {
    /// Drain what is queued now, flush the target, then complete
    Flush(AsyncContinuation),
    /// Drain everything, flush and close the target, then exit
    Shutdown,
}

pub(crate) struct Worker {
    target: Box<dyn Target>,
    queue: Arc<BoundedQueue<PendingItem>>,
    commands: Receiver<Command>,
    metrics: Arc<WrapperMetrics>,
    batch_size: usize,
    idle_wait: Duration,
}

impl Worker {
    pub(crate) fn new(
        target: Box<dyn Target>,
        queue: Arc<BoundedQueue<PendingItem>>,
        commands: Receiver<Command>,
        metrics: Arc<WrapperMetrics>,
        batch_size: usize,
        idle_wait: Duration,
    ) -> Self {
        Self {
            target,
            queue,
            commands,
            metrics,
            batch_size,
            idle_wait,
        }
    }

    pub(crate) fn spawn(self) -> Result<JoinHandle<()>> {
        let target_name = self.target.name().to_string();
        thread::Builder::new()
            .name(format!("async-wrapper-{}", target_name))
            .spawn(move || self.run())
            .map_err(|source| WrapperError::WorkerSpawn {
                target: target_name,
                source,
            })
    }

    fn run(mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(command) => {
                    if !self.handle(command) {
                        break;
                    }
                }
                Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            let batch = self.queue.dequeue_batch(self.batch_size);
            if !batch.is_empty() {
                self.process_batch(batch);
                continue;
            }

            // No idle interval: park until an event or a command arrives
            if self.idle_wait.is_zero() {
                self.queue.wait_for_items(MAX_PARK);
                continue;
            }

            // Idle: wait for the next cycle, a command cuts the wait short
            match self.commands.recv_timeout(self.idle_wait) {
                Ok(command) => {
                    if !self.handle(command) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }

        self.shutdown();
    }

    /// Returns `false` when the worker should stop
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Flush(requester) => {
                self.flush_pending(requester);
                true
            }
            Command::Shutdown => false,
        }
    }

    /// Dispatch a batch and wait for all of its acknowledgements.
    ///
    /// Returns the first error reported for the batch.
    fn process_batch(&mut self, batch: Vec<PendingItem>) -> Option<AsyncError> {
        let count = batch.len();
        self.metrics.record_batch();

        // Every adapted continuation reports exactly once, so `count` slots suffice
        let (done_tx, done_rx) = crossbeam_channel::bounded(count);
        for PendingItem {
            event,
            continuation,
        } in batch
        {
            let adapted = self.adapt(continuation, done_tx.clone());
            self.dispatch(event, adapted);
        }
        drop(done_tx);

        let mut first = FirstError::new();
        for _ in 0..count {
            match done_rx.recv() {
                Ok(outcome) => first.record(outcome),
                Err(_) => break,
            }
        }

        if !first.has_error() {
            if let Some(error) = self.flush_target() {
                eprintln!(
                    "[ASYNC WRAPPER ERROR] Flush of target '{}' after batch failed: {}",
                    self.target.name(),
                    error
                );
            }
        }

        first.into_inner()
    }

    /// Wrap a producer continuation so it also feeds batch bookkeeping
    fn adapt(
        &self,
        original: AsyncContinuation,
        done: Sender<Option<AsyncError>>,
    ) -> AsyncContinuation {
        let metrics = Arc::clone(&self.metrics);
        AsyncContinuation::new(move |error| {
            match error {
                None => metrics.record_written(),
                Some(_) => metrics.record_failed(),
            };

            let forwarded = error.clone();
            if let Err(panic_info) = catch_unwind(AssertUnwindSafe(|| original.invoke(forwarded))) {
                eprintln!(
                    "[ASYNC WRAPPER CRITICAL] Producer continuation panicked: {}",
                    panic_message(panic_info.as_ref())
                );
            }

            let _ = done.send(error);
        })
    }

    fn dispatch(&mut self, event: LogEvent, continuation: AsyncContinuation) {
        let target = &mut self.target;

        let result = if target.supports_async() {
            let handle = continuation.clone();
            catch_unwind(AssertUnwindSafe(|| target.write_async(event, handle)))
        } else {
            match catch_unwind(AssertUnwindSafe(|| target.write(&event))) {
                Ok(outcome) => {
                    continuation.invoke(outcome.err().map(Arc::new));
                    Ok(())
                }
                Err(panic_info) => Err(panic_info),
            }
        };

        if let Err(panic_info) = result {
            let message = panic_message(panic_info.as_ref());
            eprintln!(
                "[ASYNC WRAPPER CRITICAL] Target '{}' panicked during write: {}",
                self.target.name(),
                message
            );
            // No-op if the target already completed it before panicking
            continuation.fail(WrapperError::target_panicked(
                self.target.name(),
                "write",
                message,
            ));
        }
    }

    /// Flush the target and wait for its acknowledgement
    fn flush_target(&mut self) -> Option<AsyncError> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let continuation = AsyncContinuation::new(move |error| {
            let _ = tx.send(error);
        });

        let handle = continuation.clone();
        let target = &mut self.target;
        if let Err(panic_info) = catch_unwind(AssertUnwindSafe(|| target.flush_async(handle))) {
            let message = panic_message(panic_info.as_ref());
            eprintln!(
                "[ASYNC WRAPPER CRITICAL] Target '{}' panicked during flush: {}",
                self.target.name(),
                message
            );
            continuation.fail(WrapperError::target_panicked(
                self.target.name(),
                "flush",
                message,
            ));
        }
        drop(continuation);

        let outcome = rx
            .recv()
            .unwrap_or_else(|_| Some(WrapperError::ContinuationDropped.shared()));

        match outcome {
            None => self.metrics.record_flush(),
            Some(_) => self.metrics.record_flush_failure(),
        };
        outcome
    }

    /// Drain the events queued right now, then flush the target.
    ///
    /// The requester gets the first error among the drained events, else the
    /// flush error, else `None`.
    fn flush_pending(&mut self, requester: AsyncContinuation) {
        let mut first = FirstError::new();

        let mut remaining = self.queue.len();
        while remaining > 0 {
            let batch = self.queue.dequeue_batch(self.batch_size.min(remaining));
            if batch.is_empty() {
                break;
            }
            remaining -= batch.len();
            first.record(self.process_batch(batch));
        }

        first.record(self.flush_target());
        requester.invoke(first.into_inner());
    }

    fn shutdown(mut self) {
        // The queue is closed before shutdown is requested, so this terminates
        let mut first = FirstError::new();
        loop {
            let batch = self.queue.dequeue_batch(self.batch_size);
            if batch.is_empty() {
                break;
            }
            first.record(self.process_batch(batch));
        }

        // Flush requests that raced with close
        let mut requesters = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            if let Command::Flush(requester) = command {
                requesters.push(requester);
            }
        }

        first.record(self.flush_target());
        let outcome = first.into_inner();
        for requester in requesters {
            requester.invoke(outcome.clone());
        }

        let target = &mut self.target;
        if let Err(panic_info) = catch_unwind(AssertUnwindSafe(|| target.close())) {
            eprintln!(
                "[ASYNC WRAPPER CRITICAL] Target '{}' panicked during close: {}",
                self.target.name(),
                panic_message(panic_info.as_ref())
            );
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
