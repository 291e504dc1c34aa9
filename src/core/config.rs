//! Wrapper configuration

use super::error::{Result, WrapperError};
use super::overflow_action::OverflowAction;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_QUEUE_LIMIT: usize = 10_000;
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_TIME_TO_SLEEP_BETWEEN_BATCHES: Duration = Duration::from_millis(50);

/// Queue and batching settings of an [`AsyncTargetWrapper`](super::AsyncTargetWrapper)
///
/// Read once when the wrapper is initialized and never again.
///
/// # Example
///
/// ```
/// use async_target_wrapper::{AsyncWrapperConfig, OverflowAction};
/// use std::time::Duration;
///
/// let config = AsyncWrapperConfig::from_json(
///     r#"{ "queue_limit": 300, "overflow_action": "Grow", "time_to_sleep_between_batches_ms": 10 }"#,
/// ).unwrap();
///
/// assert_eq!(config.queue_limit, 300);
/// assert_eq!(config.overflow_action, OverflowAction::Grow);
/// assert_eq!(config.batch_size, 100);
/// assert_eq!(config.time_to_sleep_between_batches, Duration::from_millis(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsyncWrapperConfig {
    /// Number of events the queue holds before the overflow action applies
    pub queue_limit: usize,
    pub overflow_action: OverflowAction,
    /// Maximum number of events dispatched to the target per batch
    pub batch_size: usize,
    /// Idle wait of the worker when the queue is empty
    #[serde(rename = "time_to_sleep_between_batches_ms", with = "duration_ms")]
    pub time_to_sleep_between_batches: Duration,
}

impl AsyncWrapperConfig {
    pub fn new(queue_limit: usize, overflow_action: OverflowAction) -> Self {
        Self {
            queue_limit,
            overflow_action,
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_limit == 0 {
            return Err(WrapperError::config(
                "AsyncTargetWrapper",
                "queue_limit must be greater than zero",
            ));
        }
        if self.batch_size == 0 {
            return Err(WrapperError::config(
                "AsyncTargetWrapper",
                "batch_size must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for AsyncWrapperConfig {
    fn default() -> Self {
        Self {
            queue_limit: DEFAULT_QUEUE_LIMIT,
            overflow_action: OverflowAction::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            time_to_sleep_between_batches: DEFAULT_TIME_TO_SLEEP_BETWEEN_BATCHES,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AsyncWrapperConfig::default();
        assert_eq!(config.queue_limit, 10_000);
        assert_eq!(config.overflow_action, OverflowAction::Discard);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.time_to_sleep_between_batches, Duration::from_millis(50));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_new_keeps_batch_defaults() {
        let config = AsyncWrapperConfig::new(300, OverflowAction::Grow);
        assert_eq!(config.queue_limit, 300);
        assert_eq!(config.overflow_action, OverflowAction::Grow);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = AsyncWrapperConfig::new(0, OverflowAction::Block);
        assert!(matches!(
            config.validate(),
            Err(WrapperError::InvalidConfiguration { .. })
        ));

        let config = AsyncWrapperConfig {
            batch_size: 0,
            ..AsyncWrapperConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_json_roundtrip_uses_millis() {
        let config = AsyncWrapperConfig {
            queue_limit: 42,
            overflow_action: OverflowAction::Block,
            batch_size: 7,
            time_to_sleep_between_batches: Duration::from_millis(5),
        };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"time_to_sleep_between_batches_ms\": 5"));
        assert_eq!(AsyncWrapperConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            AsyncWrapperConfig::from_json("{ \"batch_size\": 0 }"),
            Err(WrapperError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            AsyncWrapperConfig::from_json("{ \"overflow_action\": \"Spill\" }"),
            Err(WrapperError::Json(_))
        ));
    }
}
