//! File target example
//!
//! Wraps a locked file target, configured from JSON, and shows what the
//! Discard overflow action does when producers outrun the target.
//!
//! Run with: cargo run --example file_target

use async_target_wrapper::prelude::*;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Async Target Wrapper - File Example ===\n");

    let config = AsyncWrapperConfig::from_json(
        r#"{
            "queue_limit": 200,
            "overflow_action": "Discard",
            "batch_size": 100,
            "time_to_sleep_between_batches_ms": 20
        }"#,
    )?;
    println!("Configuration:\n{}\n", config.to_json()?);

    let target = FileTarget::new("wrapped.log")?.with_exclusive_lock(true);
    let wrapper = AsyncTargetWrapper::builder()
        .target(target)
        .config(config)
        .on_overflow(Arc::new(|count| {
            eprintln!("ALERT: {} events discarded so far", count);
        }))
        .build()?;
    wrapper.initialize()?;

    for i in 0..5000 {
        wrapper.write(
            LogEvent::new(LogLevel::Info, format!("Burst message {}", i)).with_logger_name("file-demo"),
        );
    }

    // Drains whatever is still queued, then closes the file
    wrapper.close();

    let metrics = wrapper.metrics();
    println!("Enqueued:  {}", metrics.enqueued_count());
    println!("Discarded: {} ({:.2}%)", metrics.discarded_count(), metrics.discard_rate());
    println!("Written:   {}", metrics.written_count());
    println!("\nCheck 'wrapped.log' for file output");
    Ok(())
}
