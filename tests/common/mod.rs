//! Targets and helpers shared by the integration tests

#![allow(dead_code)]

use async_target_wrapper::prelude::*;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

pub const WAIT: Duration = Duration::from_secs(5);

/// Poll `condition` until it holds or `timeout` expires
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Write/flush counters shared between a target and the test
#[derive(Default)]
pub struct Counters {
    pub writes: AtomicUsize,
    pub flushes: AtomicUsize,
    pub messages: Mutex<Vec<String>>,
}

impl Counters {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

/// Synchronous target counting writes and flushes
pub struct SyncTarget {
    pub counters: Arc<Counters>,
    /// Messages rejected with an error
    pub fail_on: Vec<String>,
}

impl SyncTarget {
    pub fn new() -> (Self, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        (
            Self {
                counters: Arc::clone(&counters),
                fail_on: Vec::new(),
            },
            counters,
        )
    }
}

impl Target for SyncTarget {
    fn name(&self) -> &str {
        "sync"
    }

    fn write(&mut self, event: &LogEvent) -> Result<()> {
        assert!(self.counters.flushes() <= self.counters.writes());
        self.counters.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&event.message) {
            return Err(WrapperError::target_write("sync", format!("rejected {}", event.message)));
        }
        self.counters.messages.lock().push(event.message.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.counters.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Async target completing on its own threads and invoking every
/// continuation twice
pub struct DoubleInvokingAsyncTarget {
    pub counters: Arc<Counters>,
    /// When set, every write fails with this exact error
    pub error: Option<AsyncError>,
}

impl DoubleInvokingAsyncTarget {
    pub fn new(error: Option<AsyncError>) -> (Self, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        (
            Self {
                counters: Arc::clone(&counters),
                error,
            },
            counters,
        )
    }
}

impl Target for DoubleInvokingAsyncTarget {
    fn name(&self) -> &str {
        "double-async"
    }

    fn write(&mut self, _event: &LogEvent) -> Result<()> {
        Err(WrapperError::other("synchronous write not supported"))
    }

    fn supports_async(&self) -> bool {
        true
    }

    fn write_async(&mut self, event: LogEvent, continuation: AsyncContinuation) {
        assert!(self.counters.flushes() <= self.counters.writes());
        self.counters.writes.fetch_add(1, Ordering::SeqCst);
        self.counters.messages.lock().push(event.message);

        let error = self.error.clone();
        thread::spawn(move || {
            continuation.invoke(error.clone());
            continuation.invoke(error);
        });
    }

    fn flush_async(&mut self, continuation: AsyncContinuation) {
        self.counters.flushes.fetch_add(1, Ordering::SeqCst);
        thread::spawn(move || {
            continuation.succeed();
        });
    }
}

/// Synchronous target whose writes wait until the gate is opened
pub struct GatedTarget {
    pub counters: Arc<Counters>,
    pub gate: Arc<Gate>,
    /// Messages rejected with an error once through the gate
    pub fail_on: Vec<String>,
}

#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
    /// Number of writes that have started
    pub entered: AtomicUsize,
}

impl Gate {
    pub fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }

    fn pass(&self) {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
    }

    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }
}

impl GatedTarget {
    pub fn new() -> (Self, Arc<Counters>, Arc<Gate>) {
        let counters = Arc::new(Counters::default());
        let gate = Arc::new(Gate::default());
        (
            Self {
                counters: Arc::clone(&counters),
                gate: Arc::clone(&gate),
                fail_on: Vec::new(),
            },
            counters,
            gate,
        )
    }
}

impl Target for GatedTarget {
    fn name(&self) -> &str {
        "gated"
    }

    fn write(&mut self, event: &LogEvent) -> Result<()> {
        self.gate.pass();
        self.counters.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&event.message) {
            return Err(WrapperError::target_write("gated", format!("rejected {}", event.message)));
        }
        self.counters.messages.lock().push(event.message.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.counters.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Outcome captured by [`capture`]
#[derive(Default)]
pub struct Captured {
    pub calls: AtomicUsize,
    pub error: Mutex<Option<AsyncError>>,
    pub thread: Mutex<Option<ThreadId>>,
}

impl Captured {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn error(&self) -> Option<AsyncError> {
        self.error.lock().clone()
    }

    pub fn thread(&self) -> Option<ThreadId> {
        *self.thread.lock()
    }
}

/// Continuation recording its outcome, call count and calling thread
pub fn capture() -> (AsyncContinuation, Arc<Captured>) {
    let captured = Arc::new(Captured::default());
    let sink = Arc::clone(&captured);
    let continuation = AsyncContinuation::new(move |error| {
        *sink.error.lock() = error;
        *sink.thread.lock() = Some(thread::current().id());
        sink.calls.fetch_add(1, Ordering::SeqCst);
    });
    (continuation, captured)
}

pub fn event(message: impl Into<String>) -> LogEvent {
    LogEvent::new(LogLevel::Info, message)
}
