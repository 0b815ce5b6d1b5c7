//! Unit tests for the lifecycle capability ports
//!
//! Verifies the default capability answers of a bare actor and that a
//! service opts into monitoring through `into_service`.

use async_trait::async_trait;
use kiln_domain::constants::STAGE_DEFAULT;
use kiln_domain::{Actor, Error, Result, Service};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct Plain;

#[async_trait]
impl Actor for Plain {
    async fn start(&self, _token: &CancellationToken) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }
}

struct Worker;

#[async_trait]
impl Actor for Worker {
    async fn start(&self, _token: &CancellationToken) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> Option<String> {
        Some("worker".to_string())
    }

    fn into_service(self: Arc<Self>) -> Option<Arc<dyn Service>> {
        Some(self)
    }
}

#[async_trait]
impl Service for Worker {
    async fn done(&self) {}

    fn err(&self) -> Option<Error> {
        None
    }
}

/// Test a bare actor takes the default capabilities
#[test]
fn test_actor_defaults() {
    let actor: Arc<dyn Actor> = Arc::new(Plain);
    assert_eq!(actor.stage(), STAGE_DEFAULT);
    assert!(actor.name().is_none());
    assert!(!actor.requires_stop());
    assert!(actor.readiness().is_none());
    assert!(actor.type_name().ends_with("Plain"));
    assert!(actor.into_service().is_none());
}

/// Test a service is discoverable through the actor view
#[tokio::test]
async fn test_service_capability_is_discoverable() {
    let actor: Arc<dyn Actor> = Arc::new(Worker);
    let service = Arc::clone(&actor).into_service().expect("worker is a service");
    service.done().await;
    assert!(service.err().is_none());
    assert_eq!(service.name().as_deref(), Some("worker"));
    actor.start(&CancellationToken::new()).await.unwrap();
}
