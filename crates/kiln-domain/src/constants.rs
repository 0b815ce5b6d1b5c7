//! Domain-level constants
//!
//! Stage ordinals and shutdown budgets shared by the container and the
//! lifecycle orchestrator.

use std::time::Duration;

// ============================================================================
// Actor Stages
// ============================================================================

/// Stage of actors that do not declare one
pub const STAGE_DEFAULT: i64 = 0;

/// Stage of readiness-gated actors
///
/// Kept well below `i64::MAX` so an actor that must come after a
/// readiness-gated one can still pick a higher stage.
pub const STAGE_READINESS: i64 = i64::MAX - 1000;

// ============================================================================
// Shutdown Budgets
// ============================================================================

/// Default timeout for stopping all actors during shutdown
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for stopping each individual actor
pub const DEFAULT_STOP_EACH_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Naming
// ============================================================================

/// Name given to lifecycles created without one
pub const DEFAULT_LIFECYCLE_NAME: &str = "lifecycle";

/// Separator between dependency path segments
pub const PATH_SEPARATOR: &str = " -> ";
