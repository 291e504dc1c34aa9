//! Overflow actions for the async wrapper queue
//!
//! When the event queue has reached its limit, the overflow action decides
//! what happens to the next event a producer submits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Action taken when the queue is full at enqueue time
///
/// # Example
///
/// ```
/// use async_target_wrapper::OverflowAction;
///
/// // Default behavior: drop the new event
/// let action = OverflowAction::default();
/// assert_eq!(action, OverflowAction::Discard);
///
/// let action: OverflowAction = "block".parse().unwrap();
/// assert_eq!(action, OverflowAction::Block);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OverflowAction {
    /// Accept the event anyway; the queue limit becomes advisory
    ///
    /// Bursts cost memory, never latency or errors.
    Grow,

    /// Drop the new event
    ///
    /// The producer sees success and the drop is counted in the metrics.
    #[default]
    Discard,

    /// Wait until the worker frees a slot or the wrapper closes
    ///
    /// Warning: this applies backpressure to the producing thread.
    Block,
}

impl fmt::Display for OverflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowAction::Grow => write!(f, "Grow"),
            OverflowAction::Discard => write!(f, "Discard"),
            OverflowAction::Block => write!(f, "Block"),
        }
    }
}

impl FromStr for OverflowAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grow" => Ok(OverflowAction::Grow),
            "discard" => Ok(OverflowAction::Discard),
            "block" => Ok(OverflowAction::Block),
            _ => Err(format!("Invalid overflow action: '{}'", s)),
        }
    }
}

/// Callback type for discard notifications
///
/// Called when events are discarded because the queue is full.
/// The parameter is the total count of discarded events so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;
