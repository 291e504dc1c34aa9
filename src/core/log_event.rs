//! Log event passed through the wrapper
//!
//! The wrapper never looks inside an event; it only moves it from the
//! producer to the target. The fields exist for the targets.

use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SEQUENCE_ID: AtomicU64 = AtomicU64::new(0);

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn current_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn current_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub thread_id: String,
    pub thread_name: Option<String>,
    /// Process-wide creation order
    pub sequence_id: u64,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            logger_name: None,
            timestamp: Utc::now(),
            thread_id: current_thread_id(),
            thread_name: current_thread_name(),
            sequence_id: NEXT_SEQUENCE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn with_logger_name(mut self, name: impl Into<String>) -> Self {
        self.logger_name = Some(name.into());
        self
    }

    /// Thread name if set, thread id otherwise
    pub fn thread_label(&self) -> &str {
        self.thread_name.as_deref().unwrap_or(&self.thread_id)
    }

    /// Plain-text rendering used by the file targets, newline terminated:
    /// `[timestamp] [LEVEL] [thread] logger: message`
    pub fn format_line(&self) -> String {
        let mut line = format!(
            "[{}] [{:5}] [{}] ",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level.to_str(),
            self.thread_label(),
        );
        if let Some(ref logger_name) = self.logger_name {
            line.push_str(logger_name);
            line.push_str(": ");
        }
        line.push_str(&self.message);
        line.push('\n');
        line
    }
}

impl Default for LogEvent {
    fn default() -> Self {
        Self::new(LogLevel::Info, String::new())
    }
}
