//! Flush and close example
//!
//! Uses a slow custom target to show that `flush` waits for queued events,
//! reports the first write error, and that `close` drains the queue.
//!
//! Run with: cargo run --example flush_and_close

use async_target_wrapper::prelude::*;
use std::thread;
use std::time::Duration;

/// Target that takes a while per event and rejects empty messages
struct SlowTarget {
    written: usize,
}

impl Target for SlowTarget {
    fn name(&self) -> &str {
        "slow"
    }

    fn write(&mut self, event: &LogEvent) -> Result<()> {
        thread::sleep(Duration::from_millis(2));
        if event.message.is_empty() {
            return Err(WrapperError::target_write("slow", "empty message"));
        }
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        println!("   [slow] flushed after {} events", self.written);
        Ok(())
    }

    fn close(&mut self) {
        println!("   [slow] closed, {} events written", self.written);
    }
}

fn main() -> Result<()> {
    println!("=== Async Target Wrapper - Flush and Close Example ===\n");

    let wrapper = AsyncTargetWrapper::with_queue_limit(SlowTarget { written: 0 }, 100, OverflowAction::Grow);
    wrapper.initialize()?;

    println!("1. Flush waits for queued events:");
    for i in 0..20 {
        wrapper.write(LogEvent::new(LogLevel::Info, format!("Message {}", i)));
    }
    match wrapper.flush(Duration::from_secs(5)) {
        Ok(()) => println!("   flush completed, queue length {}", wrapper.queue_len()),
        Err(e) => println!("   flush failed: {}", e),
    }

    println!("\n2. Write errors reach the continuation, flush reports queued ones:");
    wrapper.write_with(LogEvent::new(LogLevel::Warn, ""), |error| {
        if let Some(e) = error {
            println!("   write failed: {}", e);
        }
    });
    wrapper.write(LogEvent::new(LogLevel::Info, "after the bad one"));
    match wrapper.flush(Duration::from_secs(5)) {
        Ok(()) => println!("   flush completed (the failed event was already written)"),
        Err(e) => println!("   flush failed: {}", e),
    }

    println!("\n3. Close drains the queue:");
    for i in 0..30 {
        wrapper.write(LogEvent::new(LogLevel::Info, format!("Late message {}", i)));
    }
    let finished = wrapper.close();
    println!("   worker finished in time: {}", finished);

    println!("\n4. Writes after close fail immediately:");
    wrapper.write_with(LogEvent::new(LogLevel::Info, "too late"), |error| {
        if let Some(e) = error {
            println!("   {}", e);
        }
    });

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
