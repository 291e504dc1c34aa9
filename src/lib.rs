//! # Async Target Wrapper
//!
//! Asynchronous delivery layer for logging pipelines. An
//! [`AsyncTargetWrapper`] sits in front of a [`Target`] that performs the
//! actual I/O, buffers events in a bounded queue and writes them from a
//! dedicated worker thread in batches.
//!
//! ## Features
//!
//! - **Non-blocking producers**: writes return immediately (except under the
//!   `Block` overflow action)
//! - **Overflow actions**: `Grow`, `Discard` or `Block` when the queue is full
//! - **Batching**: events reach the target in FIFO order, a clean batch is
//!   followed by a flush
//! - **Continuations**: every write reports its outcome exactly once
//!
//! ## Example
//!
//! ```
//! use async_target_wrapper::prelude::*;
//!
//! struct Null;
//!
//! impl Target for Null {
//!     fn name(&self) -> &str {
//!         "null"
//!     }
//!
//!     fn write(&mut self, _event: &LogEvent) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let wrapper = AsyncTargetWrapper::with_queue_limit(Null, 300, OverflowAction::Grow);
//! wrapper.initialize().unwrap();
//! wrapper.write(LogEvent::new(LogLevel::Info, "Server started"));
//! wrapper.close();
//! ```

pub mod core;
pub mod targets;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::targets::ConsoleTarget;
    #[cfg(feature = "file")]
    pub use crate::targets::FileTarget;
    pub use crate::core::{
        AsyncContinuation, AsyncError, AsyncTargetWrapper, AsyncTargetWrapperBuilder,
        AsyncWrapperConfig, LogEvent, LogLevel, OverflowAction, OverflowCallback, Result, Target,
        WrapperError, WrapperMetrics, WrapperState, DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

#[cfg(feature = "console")]
pub use targets::ConsoleTarget;
#[cfg(feature = "file")]
pub use targets::FileTarget;
pub use core::{
    AsyncContinuation, AsyncError, AsyncTargetWrapper, AsyncTargetWrapperBuilder,
    AsyncWrapperConfig, BoundedQueue, EnqueueOutcome, FirstError, LogEvent, LogLevel,
    OverflowAction, OverflowCallback, Result, Target, WrapperError, WrapperMetrics, WrapperState,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
