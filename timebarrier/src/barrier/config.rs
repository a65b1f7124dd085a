//! Configuration types for time barriers.

use crate::errors::BarrierError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When the barrier arms a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmingPolicy {
    /// One timer, armed by `initialize()`. Only the first race is bounded;
    /// later calls time out only while that timer is still pending.
    #[default]
    Once,
    /// A fresh timer after every `execute()`, so each call is bounded by
    /// the timeout measured from the end of the previous call.
    Rearm,
}

impl std::fmt::Display for ArmingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Once => write!(f, "once"),
            Self::Rearm => write!(f, "rearm"),
        }
    }
}

/// Configuration for a time barrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrierConfig {
    /// Whether timing is enabled. Disabled barriers run every section.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Timeout in milliseconds. Zero fires as soon as possible.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Arming policy.
    #[serde(default)]
    pub arming: ArmingPolicy,
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    1000
}

impl Default for BarrierConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            timeout_ms: default_timeout_ms(),
            arming: ArmingPolicy::default(),
        }
    }
}

impl BarrierConfig {
    /// Creates a new barrier configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, BarrierError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the timeout in milliseconds.
    #[must_use]
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Enables or disables timing.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the arming policy.
    #[must_use]
    pub fn with_arming(mut self, arming: ArmingPolicy) -> Self {
        self.arming = arming;
        self
    }

    /// Returns the timeout as a duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
