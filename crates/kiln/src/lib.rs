//! # Kiln
//!
//! Type-keyed dependency injection and lifecycle orchestration for async
//! services.
//!
//! Constructors are registered in a container and run lazily, once each.
//! A lifecycle builds the container, starts actors by stage, waits for
//! readiness, monitors long-running services and stops everything in
//! reverse order.
//!
//! ## Example
//!
//! ```ignore
//! use kiln::{ActorRegistry, FuncService, Lifecycle, Result};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let lifecycle = Lifecycle::new()?;
//! lifecycle.provide(|registry: Arc<ActorRegistry>| -> Result<Arc<FuncService>> {
//!     registry.register(Arc::new(FuncService::new(|token| async move {
//!         token.cancelled().await;
//!         Ok(())
//!     })))
//! })?;
//! lifecycle.serve(CancellationToken::new()).await?;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - errors, keys, dependency paths and the actor ports
//! - `inject` - the dependency container
//! - `lifecycle` - the orchestrator and closure-backed actors
//! - `infrastructure` - configuration and logging

pub mod init;

/// Domain layer - errors, keys and ports
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use kiln_domain::*;
}

/// Dependency container
///
/// Re-exports from the inject crate for convenience
pub mod inject {
    pub use kiln_inject::*;
}

/// Lifecycle orchestrator
///
/// Re-exports from the lifecycle crate for convenience
pub mod lifecycle {
    pub use kiln_lifecycle::*;
}

/// Infrastructure layer - configuration and logging
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use kiln_infrastructure::*;
}

// Re-export commonly used types at the crate root
pub use domain::{Actor, Error, Readiness, Result, Service};
pub use inject::{Collected, Container, Element, Injectable, Injected, Module, Void};
pub use lifecycle::{ActorRegistry, FuncActor, FuncService, Lifecycle, ReadinessProbe, serve};

// Re-export main entry point at the crate root
pub use init::run;
