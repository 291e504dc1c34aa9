//! Target implementations

#[cfg(feature = "console")]
pub mod console;
#[cfg(feature = "file")]
pub mod file;

#[cfg(feature = "async-targets")]
pub mod async_file;

#[cfg(feature = "console")]
pub use console::ConsoleTarget;
#[cfg(feature = "file")]
pub use file::FileTarget;

#[cfg(feature = "async-targets")]
pub use async_file::AsyncFileTarget;

// Re-export the trait for convenience
pub use crate::core::Target;
