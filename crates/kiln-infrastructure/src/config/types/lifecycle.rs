//! Lifecycle configuration

use kiln_domain::constants::{DEFAULT_LIFECYCLE_NAME, DEFAULT_STOP_EACH_TIMEOUT, DEFAULT_STOP_TIMEOUT};
use kiln_domain::Result;
use kiln_lifecycle::Lifecycle;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name and shutdown budgets of a lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Name used in logs and readiness reports
    pub name: String,
    /// Global deadline for the stop phase, in milliseconds
    pub stop_timeout_ms: u64,
    /// Deadline for each actor's stop, in milliseconds
    pub stop_each_timeout_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_LIFECYCLE_NAME.to_string(),
            stop_timeout_ms: duration_ms(DEFAULT_STOP_TIMEOUT),
            stop_each_timeout_ms: duration_ms(DEFAULT_STOP_EACH_TIMEOUT),
        }
    }
}

impl LifecycleConfig {
    /// Global stop deadline
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    /// Per-actor stop deadline
    pub fn stop_each_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_each_timeout_ms)
    }

    /// Apply name and budgets to `lifecycle`
    pub fn apply_to(&self, lifecycle: &Lifecycle) -> Result<()> {
        lifecycle
            .with_name(self.name.clone())?
            .with_stop_timeout(self.stop_timeout())?
            .with_stop_each_timeout(self.stop_each_timeout())?;
        Ok(())
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
