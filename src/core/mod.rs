//! Core wrapper types and traits

pub mod config;
pub mod continuation;
pub mod error;
pub mod log_event;
pub mod log_level;
pub mod metrics;
pub mod overflow_action;
pub mod queue;
pub mod target;
mod worker;
pub mod wrapper;

pub use config::{
    AsyncWrapperConfig, DEFAULT_BATCH_SIZE, DEFAULT_QUEUE_LIMIT,
    DEFAULT_TIME_TO_SLEEP_BETWEEN_BATCHES,
};
pub use continuation::{AsyncContinuation, FirstError};
pub use error::{AsyncError, Result, WrapperError};
pub use log_event::LogEvent;
pub use log_level::LogLevel;
pub use metrics::WrapperMetrics;
pub use overflow_action::{OverflowAction, OverflowCallback};
pub use queue::{BoundedQueue, EnqueueOutcome};
pub use target::Target;
pub use wrapper::{
    AsyncTargetWrapper, AsyncTargetWrapperBuilder, WrapperState, DEFAULT_SHUTDOWN_TIMEOUT,
};
