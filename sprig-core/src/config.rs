//! Runtime Configuration
//!
//! Tunables for the scheduler loop, property classification and the
//! frame-budget idle source. Every field has a default, so a configuration
//! document only needs to name what it overrides.
//!
//! Durations are written as (fractional) milliseconds:
//!
//! ```json
//! { "yield_threshold": 0.5, "event_prefix": "on", "idle_timeout": 250 }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Runtime tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// The scheduler loop yields once less than this much time is left in
    /// the current idle slot.
    #[serde(with = "millis")]
    pub yield_threshold: Duration,

    /// Property keys starting with this prefix name event listeners.
    pub event_prefix: String,

    /// Length of one host frame, used by
    /// [`FrameIdleSource`](crate::scheduler::FrameIdleSource).
    #[serde(with = "millis")]
    pub frame_budget: Duration,

    /// How long a pending idle request may wait for a frame with spare time
    /// before it is run anyway with `did_timeout` set. `None` waits forever.
    #[serde(with = "opt_millis")]
    pub idle_timeout: Option<Duration>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            event_prefix: "on".to_string(),
            frame_budget: Duration::from_micros(16_600),
            idle_timeout: None,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        if !ms.is_finite() || ms < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "expected a non-negative duration in milliseconds, got {ms}"
            )));
        }
        Duration::try_from_secs_f64(ms / 1000.0).map_err(serde::de::Error::custom)
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => super::millis::serialize(duration, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let ms = Option::<f64>::deserialize(deserializer)?;
        match ms {
            None => Ok(None),
            Some(ms) if ms.is_finite() && ms >= 0.0 => {
                Duration::try_from_secs_f64(ms / 1000.0)
                    .map(Some)
                    .map_err(serde::de::Error::custom)
            }
            Some(ms) => Err(serde::de::Error::custom(format!(
                "expected a non-negative timeout in milliseconds, got {ms}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = RuntimeConfig::from_json("{}").unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn overrides_are_parsed_as_millis() {
        let config = RuntimeConfig::from_json(
            r#"{ "yield_threshold": 0.5, "event_prefix": "on", "idle_timeout": 250 }"#,
        )
        .unwrap();
        assert_eq!(config.yield_threshold, Duration::from_micros(500));
        assert_eq!(config.idle_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.frame_budget, Duration::from_micros(16_600));
    }

    #[test]
    fn negative_durations_are_rejected() {
        let err = RuntimeConfig::from_json(r#"{ "frame_budget": -3 }"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid runtime configuration"));
    }

    #[test]
    fn out_of_range_durations_are_rejected() {
        let err = RuntimeConfig::from_json(r#"{ "frame_budget": 1e300 }"#).unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));

        let err = RuntimeConfig::from_json(r#"{ "idle_timeout": 1e300 }"#).unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));
    }
}
