//! Stress tests for the async target wrapper
//!
//! These tests verify:
//! - No event loss under Block with many concurrent producers
//! - Per-producer ordering is preserved through the queue
//! - Discard keeps producers non-blocking under a flood
//! - Concurrent flushes and a racing close all complete

mod common;

use async_target_wrapper::prelude::*;
use common::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const PRODUCERS: usize = 8;
const EVENTS_PER_PRODUCER: usize = 500;

/// Block with a tiny queue must not lose a single event
#[test]
fn test_block_no_loss_under_contention() {
    let (target, counters) = SyncTarget::new();
    let wrapper = Arc::new(
        AsyncTargetWrapper::builder()
            .target(target)
            .queue_limit(4)
            .overflow_action(OverflowAction::Block)
            .batch_size(3)
            .time_to_sleep_between_batches(Duration::from_millis(1))
            .build()
            .unwrap(),
    );
    wrapper.initialize().unwrap();

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let wrapper = Arc::clone(&wrapper);
            thread::spawn(move || {
                for i in 0..EVENTS_PER_PRODUCER {
                    wrapper.write(event(format!("{}:{}", producer, i)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(wrapper.close());

    let messages = counters.messages();
    assert_eq!(messages.len(), PRODUCERS * EVENTS_PER_PRODUCER);
    assert_eq!(wrapper.discarded_count(), 0);

    // Interleaving across producers is arbitrary, order within one is not
    let mut next: HashMap<usize, usize> = HashMap::new();
    for message in &messages {
        let (producer, index) = message.split_once(':').unwrap();
        let producer: usize = producer.parse().unwrap();
        let index: usize = index.parse().unwrap();
        let expected = next.entry(producer).or_insert(0);
        assert_eq!(index, *expected, "producer {} out of order", producer);
        *expected += 1;
    }
}

/// Every continuation fires exactly once, even with producers racing
#[test]
fn test_every_continuation_fires_once_concurrently() {
    let (target, _) = DoubleInvokingAsyncTarget::new(None);
    let wrapper = Arc::new(AsyncTargetWrapper::with_queue_limit(
        target,
        64,
        OverflowAction::Block,
    ));
    wrapper.initialize().unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let wrapper = Arc::clone(&wrapper);
            let fired = Arc::clone(&fired);
            thread::spawn(move || {
                for i in 0..200 {
                    let fired = Arc::clone(&fired);
                    wrapper.write_with(event(format!("m{}", i)), move |_| {
                        fired.fetch_add(1, Ordering::SeqCst);
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(wait_until(WAIT, || fired.load(Ordering::SeqCst) == PRODUCERS * 200));
    // Second invocations from the target must never leak through
    thread::sleep(Duration::from_millis(50));
    assert_eq!(fired.load(Ordering::SeqCst), PRODUCERS * 200);
}

/// Discard must keep producers moving while the target is stuck
#[test]
fn test_discard_flood_does_not_block() {
    let (target, counters, gate) = GatedTarget::new();
    let wrapper = Arc::new(AsyncTargetWrapper::with_queue_limit(
        target,
        100,
        OverflowAction::Discard,
    ));
    wrapper.initialize().unwrap();

    wrapper.write(event("in-flight"));
    assert!(wait_until(WAIT, || gate.entered() == 1));

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let wrapper = Arc::clone(&wrapper);
            thread::spawn(move || {
                for i in 0..1000 {
                    wrapper.write(event(format!("flood {}", i)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(wrapper.queue_len(), 100);
    assert_eq!(wrapper.discarded_count(), (PRODUCERS * 1000 - 100) as u64);

    gate.open();
    assert!(wrapper.close());
    assert_eq!(counters.writes(), 101);
}

/// Flushes issued from many threads all complete
#[test]
fn test_concurrent_flushes_complete() {
    let (target, counters) = SyncTarget::new();
    let wrapper = Arc::new(AsyncTargetWrapper::with_queue_limit(
        target,
        10_000,
        OverflowAction::Grow,
    ));
    wrapper.initialize().unwrap();

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let wrapper = Arc::clone(&wrapper);
            thread::spawn(move || {
                for i in 0..100 {
                    wrapper.write(event(format!("{}:{}", producer, i)));
                    if i % 25 == 0 {
                        wrapper.flush(WAIT).expect("flush succeeds");
                    }
                }
                wrapper.flush(WAIT).expect("final flush succeeds");
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(counters.writes(), PRODUCERS * 100);
    assert!(wrapper.metrics().flush_count() as usize >= PRODUCERS * 5);
}

/// A close racing with producers loses nothing that was accepted
#[test]
fn test_close_while_producing() {
    let (target, counters) = SyncTarget::new();
    let wrapper = Arc::new(AsyncTargetWrapper::with_queue_limit(
        target,
        16,
        OverflowAction::Block,
    ));
    wrapper.initialize().unwrap();

    let accepted = Arc::new(AtomicUsize::new(0));
    let rejected = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let wrapper = Arc::clone(&wrapper);
            let accepted = Arc::clone(&accepted);
            let rejected = Arc::clone(&rejected);
            thread::spawn(move || {
                for i in 0..500 {
                    let accepted = Arc::clone(&accepted);
                    let rejected = Arc::clone(&rejected);
                    wrapper.write_with(event(format!("m{}", i)), move |error| {
                        let counter = if error.is_none() { accepted } else { rejected };
                        counter.fetch_add(1, Ordering::SeqCst);
                    });
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(5));
    assert!(wrapper.close());
    for handle in handles {
        handle.join().unwrap();
    }

    let accepted = accepted.load(Ordering::SeqCst);
    assert_eq!(accepted + rejected.load(Ordering::SeqCst), PRODUCERS * 500);
    assert_eq!(counters.writes(), accepted);
}

/// High-volume writes through a real file target
#[test]
fn test_rapid_burst_to_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("burst.log");

    {
        let target = FileTarget::new(&log_file).expect("Failed to create target");
        let wrapper = Arc::new(AsyncTargetWrapper::with_queue_limit(
            target,
            256,
            OverflowAction::Block,
        ));
        wrapper.initialize().unwrap();

        let handles: Vec<_> = (0..4)
            .map(|producer| {
                let wrapper = Arc::clone(&wrapper);
                thread::spawn(move || {
                    for i in 0..2500 {
                        wrapper.write(
                            LogEvent::new(LogLevel::Info, format!("burst {} {}", producer, i))
                                .with_logger_name("stress"),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(wrapper.close_with_timeout(Duration::from_secs(30)));
    }

    let content = std::fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content.lines().count(), 10_000);
    assert!(content.lines().all(|line| line.contains("stress: burst")));
}

/// CPU ticks (user + system) consumed so far by the thread whose kernel
/// name is `comm`
#[cfg(target_os = "linux")]
fn thread_cpu_ticks(comm: &str) -> Option<u64> {
    for task in std::fs::read_dir("/proc/self/task").ok()?.flatten() {
        let name = std::fs::read_to_string(task.path().join("comm")).ok()?;
        if name.trim_end() != comm {
            continue;
        }
        let stat = std::fs::read_to_string(task.path().join("stat")).ok()?;
        let fields: Vec<&str> = stat.rsplit_once(')')?.1.split_whitespace().collect();
        let utime: u64 = fields.get(11)?.parse().ok()?;
        let stime: u64 = fields.get(12)?.parse().ok()?;
        return Some(utime + stime);
    }
    None
}

/// A zero idle interval must park the worker, not spin it
#[cfg(target_os = "linux")]
#[test]
fn test_zero_idle_interval_does_not_spin() {
    struct ZeroIdle(Arc<AtomicUsize>);

    impl Target for ZeroIdle {
        fn name(&self) -> &str {
            "zero-idle"
        }

        fn write(&mut self, _event: &LogEvent) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let writes = Arc::new(AtomicUsize::new(0));
    let wrapper = AsyncTargetWrapper::builder()
        .target(ZeroIdle(Arc::clone(&writes)))
        .time_to_sleep_between_batches(Duration::ZERO)
        .build()
        .unwrap();
    wrapper.initialize().unwrap();

    // Kernel thread names are cut to 15 bytes
    let comm = "async-wrapper-zero-idle"[..15].to_string();
    thread::sleep(Duration::from_millis(100));
    let before = thread_cpu_ticks(&comm).expect("worker thread visible in /proc");
    thread::sleep(Duration::from_secs(1));
    let after = thread_cpu_ticks(&comm).expect("worker thread visible in /proc");
    assert!(
        after - before < 20,
        "idle worker used {} ticks in one second",
        after - before
    );

    // Still wakes for events and flushes
    wrapper.write(event("wake up"));
    assert!(wait_until(Duration::from_millis(500), || writes.load(Ordering::SeqCst) == 1));
    wrapper.flush(Duration::from_millis(500)).expect("flush succeeds");
    assert!(wrapper.close());
}
