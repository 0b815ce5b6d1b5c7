//! Configuration
//!
//! Sources are merged by [`ConfigLoader`], later ones overriding earlier:
//!
//! | Order | Source |
//! |-------|--------|
//! | 1 | `AppConfig::default()` |
//! | 2 | TOML file (explicit path or discovered `kiln.toml`) |
//! | 3 | `KILN__` environment variables, nested keys split on `__` |

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{AppConfig, LifecycleConfig, LoggingConfig};
