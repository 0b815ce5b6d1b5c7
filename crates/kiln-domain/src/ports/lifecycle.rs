//! Lifecycle Capability Ports
//!
//! Defines what the orchestrator needs from the components it drives.
//!
//! ## Capabilities
//!
//! | Trait | Adds | Used for |
//! |-------|------|----------|
//! | [`Actor`] | `start`, `stop` | anything with a setup/teardown step |
//! | [`Service`] | `done`, `err` | long-running actors the orchestrator monitors |
//! | [`Readiness`] | `wait` | gating the start phase on external signals |
//!
//! Capabilities are discovered at runtime: an actor opts into service
//! monitoring by overriding [`Actor::into_service`], and into readiness
//! gating by overriding [`Actor::readiness`].

use crate::constants::STAGE_DEFAULT;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A component with a start and a stop step
///
/// `start` is called once, in stage order, before monitoring begins.
/// `stop` is called in reverse start order during shutdown, under a
/// per-actor deadline imposed by the caller.
#[async_trait]
pub trait Actor: Send + Sync {
    /// Start the actor; `token` is cancelled when startup is abandoned
    async fn start(&self, token: &CancellationToken) -> Result<()>;

    /// Stop the actor
    async fn stop(&self) -> Result<()>;

    /// Display name used in logs and errors
    fn name(&self) -> Option<String> {
        None
    }

    /// Start ordinal; lower stages start first
    fn stage(&self) -> i64 {
        STAGE_DEFAULT
    }

    /// Whether `stop` must run even when `start` never completed
    fn requires_stop(&self) -> bool {
        false
    }

    /// Service view of this actor, if it is long-running
    fn into_service(self: Arc<Self>) -> Option<Arc<dyn Service>> {
        None
    }

    /// Signal the orchestrator waits on before declaring startup complete
    fn readiness(&self) -> Option<Arc<dyn Readiness>> {
        None
    }

    /// Concrete type name, used when no name is given
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A long-running actor with a completion signal
#[async_trait]
pub trait Service: Actor {
    /// Resolve once the service has finished, cleanly or not
    async fn done(&self);

    /// Failure that ended the service, if any
    fn err(&self) -> Option<Error>;
}

/// One-shot readiness signal
#[async_trait]
pub trait Readiness: Send + Sync {
    /// Wait for the signal; returns the error it was fired with
    async fn wait(&self) -> Result<()>;

    /// Display name used in logs
    fn name(&self) -> String;
}
