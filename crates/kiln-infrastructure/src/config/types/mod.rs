//! Configuration types module

pub mod app;
pub mod lifecycle;
pub mod logging;

// Re-export main types
pub use app::AppConfig;
pub use lifecycle::LifecycleConfig;
pub use logging::LoggingConfig;
