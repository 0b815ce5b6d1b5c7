//! Infrastructure constants

// ============================================================================
// Configuration
// ============================================================================

/// Environment prefix for configuration overrides (`KILN__LIFECYCLE__NAME`)
pub const CONFIG_ENV_PREFIX: &str = "KILN";

/// Separator between nested keys in environment variables
pub const CONFIG_ENV_SEPARATOR: &str = "__";

/// Configuration file looked up during discovery
pub const DEFAULT_CONFIG_FILENAME: &str = "kiln.toml";

/// Directory holding the configuration file
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Directory under the user config dir (`~/.config/kiln/kiln.toml`)
pub const USER_CONFIG_DIR: &str = "kiln";

// ============================================================================
// Logging
// ============================================================================

/// Environment variable overriding the log filter
pub const LOG_ENV_VAR: &str = "KILN_LOG";

/// Log level used when none is configured
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// File stem for the rolling log file when the path has none
pub const DEFAULT_LOG_FILE_STEM: &str = "kiln";
