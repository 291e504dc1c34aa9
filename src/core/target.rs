//! Target trait for wrapped log outputs
//!
//! A target performs the actual I/O. Apart from [`Target::initialize`] it is
//! only ever called from the wrapper's worker thread, so it needs `Send` but
//! not `Sync`.
//!
//! Synchronous targets implement [`Target::write`] and keep the defaults.
//! Targets that complete writes on their own threads return `true` from
//! [`Target::supports_async`] and override [`Target::write_async`] and
//! usually [`Target::flush_async`]. They must invoke every continuation they
//! receive exactly once; the wrapper ignores repeated invocations.

use super::continuation::AsyncContinuation;
use super::error::Result;
use super::log_event::LogEvent;
use std::sync::Arc;

pub trait Target: Send {
    fn name(&self) -> &str;

    /// Write one event synchronously
    fn write(&mut self, event: &LogEvent) -> Result<()>;

    /// Whether [`Target::write_async`] should be used instead of [`Target::write`]
    fn supports_async(&self) -> bool {
        false
    }

    fn write_async(&mut self, event: LogEvent, continuation: AsyncContinuation) {
        let outcome = self.write(&event);
        continuation.invoke(outcome.err().map(Arc::new));
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn flush_async(&mut self, continuation: AsyncContinuation) {
        let outcome = self.flush();
        continuation.invoke(outcome.err().map(Arc::new));
    }

    /// Called by [`AsyncTargetWrapper::initialize`] before the worker starts;
    /// an error aborts initialization
    ///
    /// [`AsyncTargetWrapper::initialize`]: crate::core::AsyncTargetWrapper::initialize
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called on the worker thread after the last flush
    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::WrapperError;
    use crate::core::log_level::LogLevel;
    use parking_lot::Mutex;

    struct Recording {
        written: Vec<String>,
        fail: bool,
    }

    impl Target for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn write(&mut self, event: &LogEvent) -> Result<()> {
            if self.fail {
                return Err(WrapperError::target_write("recording", "refused"));
            }
            self.written.push(event.message.clone());
            Ok(())
        }
    }

    fn capture() -> (AsyncContinuation, Arc<Mutex<Option<Option<String>>>>) {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        let continuation = AsyncContinuation::new(move |error| {
            *seen_clone.lock() = Some(error.map(|e| e.to_string()));
        });
        (continuation, seen)
    }

    #[test]
    fn test_default_write_async_adapts_write() {
        let mut target = Recording {
            written: Vec::new(),
            fail: false,
        };
        assert!(!target.supports_async());

        let (continuation, seen) = capture();
        target.write_async(LogEvent::new(LogLevel::Info, "hello"), continuation);

        assert_eq!(target.written, vec!["hello".to_string()]);
        assert_eq!(*seen.lock(), Some(None));
    }

    #[test]
    fn test_default_write_async_reports_error() {
        let mut target = Recording {
            written: Vec::new(),
            fail: true,
        };

        let (continuation, seen) = capture();
        target.write_async(LogEvent::new(LogLevel::Info, "hello"), continuation);

        assert_eq!(
            *seen.lock(),
            Some(Some("Target 'recording' failed to write: refused".to_string()))
        );
    }

    #[test]
    fn test_default_flush_async_completes() {
        let mut target = Recording {
            written: Vec::new(),
            fail: false,
        };
        let (continuation, seen) = capture();
        target.flush_async(continuation);
        assert_eq!(*seen.lock(), Some(None));
    }
}
