//! Actor registry
//!
//! Ordered list of actors a lifecycle drives. Each lifecycle binds its
//! registry in its container as `Arc<ActorRegistry>`, so constructors can
//! register the actors they build:
//!
//! ```ignore
//! lifecycle.provide(|registry: Arc<ActorRegistry>| -> Result<Arc<HttpServer>> {
//!     registry.register(Arc::new(HttpServer::bind("0.0.0.0:8080")?))
//! })?;
//! ```
//!
//! Once the start phase begins the registry is sealed and every further
//! registration fails with `AlreadyServed`.

use kiln_domain::locks::lock_mutex;
use kiln_domain::{Actor, Error, Result};
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Default)]
struct RegistryState {
    actors: Vec<Arc<dyn Actor>>,
    sealed: bool,
}

/// Ordered, sealable list of actors
#[derive(Default)]
pub struct ActorRegistry {
    state: Mutex<RegistryState>,
}

impl ActorRegistry {
    /// Empty, unsealed registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an actor
    pub fn add(&self, actor: Arc<dyn Actor>) -> Result<()> {
        let mut state = lock_mutex(&self.state, "actor registry")?;
        if state.sealed {
            return Err(Error::AlreadyServed);
        }
        debug!(
            actor = %actor.name().unwrap_or_else(|| actor.type_name().to_string()),
            index = state.actors.len(),
            "actor registered"
        );
        state.actors.push(actor);
        Ok(())
    }

    /// Append an actor and hand it back
    pub fn register<A: Actor + 'static>(&self, actor: Arc<A>) -> Result<Arc<A>> {
        self.add(Arc::clone(&actor) as Arc<dyn Actor>)?;
        Ok(actor)
    }

    /// Actors in registration order
    pub fn snapshot(&self) -> Result<Vec<Arc<dyn Actor>>> {
        Ok(lock_mutex(&self.state, "actor registry")?.actors.clone())
    }

    /// Number of registered actors
    pub fn len(&self) -> Result<usize> {
        Ok(lock_mutex(&self.state, "actor registry")?.actors.len())
    }

    /// Whether no actor is registered
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether registrations are closed
    pub fn is_sealed(&self) -> Result<bool> {
        Ok(lock_mutex(&self.state, "actor registry")?.sealed)
    }

    pub(crate) fn seal(&self) -> Result<()> {
        lock_mutex(&self.state, "actor registry")?.sealed = true;
        Ok(())
    }
}

impl std::fmt::Debug for ActorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.state.lock() {
            Ok(state) => f
                .debug_struct("ActorRegistry")
                .field("actors", &state.actors.len())
                .field("sealed", &state.sealed)
                .finish(),
            Err(_) => f.debug_struct("ActorRegistry").finish_non_exhaustive(),
        }
    }
}
