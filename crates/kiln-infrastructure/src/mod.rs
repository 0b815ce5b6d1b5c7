//! # Kiln Infrastructure
//!
//! Cross-cutting concerns around the container and the lifecycle.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Figment-based configuration loading and validation |
//! | [`logging`] | `tracing-subscriber` setup |
//! | [`error_ext`] | Context extension for foreign `Result`s |
//! | [`constants`] | File names, prefixes and defaults |

pub mod config;
pub mod constants;
pub mod error_ext;
pub mod logging;

pub use config::{AppConfig, ConfigLoader, LifecycleConfig, LoggingConfig};
pub use error_ext::ErrorContext;
pub use logging::init_logging;
