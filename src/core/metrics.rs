//! Wrapper metrics for observability
//!
//! Counters for monitoring the health of an async wrapper: discarded
//! events, failed writes, batches and flushes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for wrapper observability
///
/// # Example
///
/// ```
/// use async_target_wrapper::WrapperMetrics;
///
/// let metrics = WrapperMetrics::new();
///
/// metrics.record_enqueued();
/// metrics.record_discarded();
///
/// assert_eq!(metrics.discarded_count(), 1);
/// assert_eq!(metrics.enqueued_count(), 1);
/// ```
#[derive(Debug)]
pub struct WrapperMetrics {
    /// Events accepted into the queue
    enqueued: AtomicU64,

    /// Events dropped by the Discard overflow action
    discarded: AtomicU64,

    /// Events the target acknowledged without error
    written: AtomicU64,

    /// Events the target reported an error for
    failed: AtomicU64,

    /// Batches dispatched to the target
    batches: AtomicU64,

    /// Successful target flushes
    flushes: AtomicU64,

    /// Target flushes that reported an error
    flush_failures: AtomicU64,

    /// Times a producer had to wait for queue space
    block_events: AtomicU64,

    /// Times the Grow action accepted an event past the queue limit
    grow_events: AtomicU64,
}

impl WrapperMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            written: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            flush_failures: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
            grow_events: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued_count(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn discarded_count(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn written_count(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batch_count(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_failures(&self) -> u64 {
        self.flush_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn grow_events(&self) -> u64 {
        self.grow_events.load(Ordering::Relaxed)
    }

    /// Record an accepted event, returns the previous count
    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a discarded event, returns the previous count
    #[inline]
    pub fn record_discarded(&self) -> u64 {
        self.discarded.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_written(&self) -> u64 {
        self.written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_batch(&self) -> u64 {
        self.batches.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_flush(&self) -> u64 {
        self.flushes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_flush_failure(&self) -> u64 {
        self.flush_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_grow(&self) -> u64 {
        self.grow_events.fetch_add(1, Ordering::Relaxed)
    }

    /// Discard rate as a percentage (0.0 - 100.0) of all submitted events
    ///
    /// Returns 0.0 if nothing has been submitted.
    pub fn discard_rate(&self) -> f64 {
        let discarded = self.discarded_count() as f64;
        let total = self.enqueued_count() as f64 + discarded;
        if total == 0.0 {
            0.0
        } else {
            (discarded / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.enqueued.store(0, Ordering::Relaxed);
        self.discarded.store(0, Ordering::Relaxed);
        self.written.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.batches.store(0, Ordering::Relaxed);
        self.flushes.store(0, Ordering::Relaxed);
        self.flush_failures.store(0, Ordering::Relaxed);
        self.block_events.store(0, Ordering::Relaxed);
        self.grow_events.store(0, Ordering::Relaxed);
    }
}

impl Default for WrapperMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for WrapperMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued_count()),
            discarded: AtomicU64::new(self.discarded_count()),
            written: AtomicU64::new(self.written_count()),
            failed: AtomicU64::new(self.failed_count()),
            batches: AtomicU64::new(self.batch_count()),
            flushes: AtomicU64::new(self.flush_count()),
            flush_failures: AtomicU64::new(self.flush_failures()),
            block_events: AtomicU64::new(self.block_events()),
            grow_events: AtomicU64::new(self.grow_events()),
        }
    }
}
