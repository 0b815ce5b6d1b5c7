//! Application configuration root

use serde::{Deserialize, Serialize};

use super::{LifecycleConfig, LoggingConfig};

/// Root of the loaded configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Lifecycle naming and shutdown budgets
    pub lifecycle: LifecycleConfig,
    /// Logging setup
    pub logging: LoggingConfig,
}
