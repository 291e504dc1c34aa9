//! Async file target for non-blocking log file writing
//!
//! Uses tokio for the file I/O. Writes and flushes are forwarded over a
//! channel to a single writer task, which keeps them in submission order
//! and completes each continuation on a runtime thread.

use crate::core::{AsyncContinuation, LogEvent, Result, Target, WrapperError};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

enum Request {
    Write(LogEvent, AsyncContinuation),
    Flush(AsyncContinuation),
}

/// Async-capable file target
///
/// # Example
///
/// ```no_run
/// use async_target_wrapper::prelude::*;
/// use async_target_wrapper::targets::AsyncFileTarget;
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let target = AsyncFileTarget::new(runtime.handle().clone(), "app.log");
///
/// let wrapper = AsyncTargetWrapper::new(target);
/// wrapper.initialize().unwrap();
/// wrapper.write(LogEvent::new(LogLevel::Info, "Hello async world!"));
/// wrapper.close();
/// ```
pub struct AsyncFileTarget {
    path: PathBuf,
    runtime: Handle,
    buffer_size: usize,
    requests: Option<mpsc::UnboundedSender<Request>>,
    writer_task: Option<JoinHandle<()>>,
}

impl AsyncFileTarget {
    /// Default buffer size (64 KB)
    pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

    /// The file is opened by [`Target::initialize`]
    ///
    /// `runtime` must belong to a multi-thread runtime, or to a
    /// current-thread runtime that another thread keeps driving. Writes
    /// complete on the runtime's threads, and [`Target::close`] waits on the
    /// writer task from the wrapper's worker thread with `block_on`: against
    /// an undriven current-thread runtime that wait never ends.
    pub fn new(runtime: Handle, path: impl AsRef<Path>) -> Self {
        Self::with_buffer_size(runtime, path, Self::DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer_size(runtime: Handle, path: impl AsRef<Path>, buffer_size: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            runtime,
            buffer_size,
            requests: None,
            writer_task: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn submit(&self, request: Request) {
        let (continuation, is_flush) = match &request {
            Request::Write(_, continuation) => (continuation.clone(), false),
            Request::Flush(continuation) => (continuation.clone(), true),
        };

        let sent = self
            .requests
            .as_ref()
            .map(|requests| requests.send(request).is_ok())
            .unwrap_or(false);
        if !sent {
            const REASON: &str = "writer task is not running";
            continuation.fail(if is_flush {
                WrapperError::target_flush("async_file", REASON)
            } else {
                WrapperError::target_write("async_file", REASON)
            });
        }
    }
}

async fn run_writer(mut writer: BufWriter<File>, mut requests: mpsc::UnboundedReceiver<Request>) {
    while let Some(request) = requests.recv().await {
        match request {
            Request::Write(event, continuation) => {
                match writer.write_all(event.format_line().as_bytes()).await {
                    Ok(()) => continuation.succeed(),
                    Err(e) => continuation.fail(e.into()),
                };
            }
            Request::Flush(continuation) => {
                match writer.flush().await {
                    Ok(()) => continuation.succeed(),
                    Err(e) => continuation.fail(WrapperError::target_flush("async_file", e.to_string())),
                };
            }
        }
    }

    if let Err(e) = writer.flush().await {
        eprintln!("[ASYNC WRAPPER ERROR] Final flush of async file target failed: {}", e);
    }
}

impl Target for AsyncFileTarget {
    fn name(&self) -> &str {
        "async_file"
    }

    fn initialize(&mut self) -> Result<()> {
        if self.requests.is_some() {
            return Ok(());
        }

        // Create parent directories if they don't exist
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                WrapperError::io_operation(
                    "opening log file",
                    format!("cannot open '{}'", self.path.display()),
                    e,
                )
            })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = BufWriter::with_capacity(self.buffer_size, File::from_std(file));
        self.writer_task = Some(self.runtime.spawn(run_writer(writer, rx)));
        self.requests = Some(tx);
        Ok(())
    }

    fn write(&mut self, _event: &LogEvent) -> Result<()> {
        Err(WrapperError::target_write(
            "async_file",
            "synchronous writes are not supported, use write_async",
        ))
    }

    fn supports_async(&self) -> bool {
        true
    }

    fn write_async(&mut self, event: LogEvent, continuation: AsyncContinuation) {
        self.submit(Request::Write(event, continuation));
    }

    fn flush_async(&mut self, continuation: AsyncContinuation) {
        self.submit(Request::Flush(continuation));
    }

    fn close(&mut self) {
        // Dropping the sender lets the writer task drain and exit
        self.requests = None;
        if Handle::try_current().is_ok() {
            // block_on panics inside a runtime; the task still drains on its own
            eprintln!("[ASYNC WRAPPER WARNING] Async file target closed from inside a runtime, not waiting for the writer task");
            self.writer_task = None;
            return;
        }
        if let Some(task) = self.writer_task.take() {
            if let Err(e) = self.runtime.block_on(task) {
                eprintln!("[ASYNC WRAPPER ERROR] Async file writer task failed: {}", e);
            }
        }
    }
}
