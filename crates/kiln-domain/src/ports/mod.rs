//! Domain Port Interfaces
//!
//! Contracts implemented by components the lifecycle orchestrator drives.
//!
//! ## Organization
//!
//! - **lifecycle** - Actor, Service and Readiness capabilities

/// Lifecycle capability ports
pub mod lifecycle;

pub use lifecycle::{Actor, Readiness, Service};
