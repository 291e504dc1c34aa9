//! Async wrapper example
//!
//! Wraps a console target, logs from several threads and reports the
//! outcome of individual writes through continuations.
//!
//! Run with: cargo run --example async_wrapper

use async_target_wrapper::prelude::*;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Async Target Wrapper - Console Example ===\n");

    let wrapper = AsyncTargetWrapper::builder()
        .target(ConsoleTarget::new())
        .name("console")
        .queue_limit(1000)
        .overflow_action(OverflowAction::Block)
        .batch_size(50)
        .time_to_sleep_between_batches(Duration::from_millis(10))
        .build()?;
    wrapper.initialize()?;

    println!("1. Writes with a continuation:");
    let (tx, rx) = mpsc::channel();
    wrapper.write_with(
        LogEvent::new(LogLevel::Info, "Application started").with_logger_name("demo"),
        move |error| {
            let _ = tx.send(error);
        },
    );
    match rx.recv_timeout(Duration::from_secs(1)) {
        Ok(None) => println!("   write acknowledged"),
        Ok(Some(e)) => println!("   write failed: {}", e),
        Err(_) => println!("   no acknowledgement in time"),
    }

    println!("\n2. Multi-threaded producers:");
    let wrapper = Arc::new(wrapper);
    let handles: Vec<_> = (0..4)
        .map(|thread_id| {
            let wrapper = Arc::clone(&wrapper);
            thread::spawn(move || {
                for i in 0..5 {
                    wrapper.write(LogEvent::new(
                        LogLevel::Debug,
                        format!("Thread {} - Message {}", thread_id, i),
                    ));
                }
            })
        })
        .collect();
    for handle in handles {
        let _ = handle.join();
    }

    wrapper.write(LogEvent::new(LogLevel::Error, "Something went wrong"));

    if let Err(e) = wrapper.flush(Duration::from_secs(1)) {
        eprintln!("flush failed: {}", e);
    }

    let metrics = wrapper.metrics();
    println!(
        "\n   enqueued: {}, written: {}, batches: {}",
        metrics.enqueued_count(),
        metrics.written_count(),
        metrics.batch_count()
    );

    wrapper.close();
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
