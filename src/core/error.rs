//! Error types for the async target wrapper

use super::wrapper::WrapperState;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, WrapperError>;

/// Error as carried by an [`AsyncContinuation`](super::AsyncContinuation).
///
/// Shared so a single failure can reach both the producer and the batch
/// bookkeeping of the worker.
pub type AsyncError = Arc<WrapperError>;

#[derive(Debug, thiserror::Error)]
pub enum WrapperError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Queue full with buffer details
    #[error("Event queue full: {current}/{max} events buffered")]
    QueueFull { current: usize, max: usize },

    /// The wrapper was closed while the event was waiting or being submitted
    #[error("Async target wrapper closed")]
    WrapperClosed,

    /// Operation attempted outside the Running state
    #[error("Async target wrapper is not running (state: {0})")]
    NotRunning(WrapperState),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// The wrapped target failed to write an event
    #[error("Target '{target}' failed to write: {message}")]
    TargetWrite { target: String, message: String },

    /// The wrapped target failed to flush
    #[error("Target '{target}' failed to flush: {message}")]
    TargetFlush { target: String, message: String },

    /// The wrapped target panicked inside a write or flush
    #[error("Target '{target}' panicked during {operation}: {message}")]
    TargetPanicked {
        target: String,
        operation: String,
        message: String,
    },

    /// A continuation was dropped without ever being invoked
    #[error("Continuation dropped without being invoked")]
    ContinuationDropped,

    /// Flush did not complete in time
    #[error("Flush did not complete within {timeout_ms}ms")]
    FlushTimeout { timeout_ms: u128 },

    /// Background worker could not be started
    #[error("Failed to spawn worker thread for '{target}': {source}")]
    WorkerSpawn {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl WrapperError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        WrapperError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a queue full error with buffer details
    pub fn queue_full(current: usize, max: usize) -> Self {
        WrapperError::QueueFull { current, max }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        WrapperError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a target write error
    pub fn target_write(target: impl Into<String>, message: impl Into<String>) -> Self {
        WrapperError::TargetWrite {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a target flush error
    pub fn target_flush(target: impl Into<String>, message: impl Into<String>) -> Self {
        WrapperError::TargetFlush {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a target panic error
    pub fn target_panicked(
        target: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        WrapperError::TargetPanicked {
            target: target.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        WrapperError::Other(msg.into())
    }

    /// Wrap into the shared form passed to continuations
    pub fn shared(self) -> AsyncError {
        Arc::new(self)
    }
}
