//! Readiness probes
//!
//! A [`ReadinessProbe`] is a one-shot signal. The first call to
//! [`ReadinessProbe::signal`] records the outcome and releases every waiter;
//! later calls have no effect. Clones share the same signal.
//!
//! Probes reach the orchestrator two ways: an actor returns one from
//! `Actor::readiness`, or a constructor contributes one as
//! `Element<ReadinessProbe>`.

use async_trait::async_trait;
use kiln_domain::locks::{lock_rwlock_read, lock_rwlock_write};
use kiln_domain::{Error, Readiness, Result};
use std::sync::{Arc, OnceLock, RwLock};
use tokio_util::sync::CancellationToken;

struct ProbeInner {
    fired: CancellationToken,
    outcome: OnceLock<Option<Error>>,
    name: RwLock<String>,
}

/// Fire-once readiness signal
#[derive(Clone)]
pub struct ReadinessProbe {
    inner: Arc<ProbeInner>,
}

impl ReadinessProbe {
    /// Unnamed probe
    pub fn new() -> Self {
        Self::named(String::new())
    }

    /// Probe with a display name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ProbeInner {
                fired: CancellationToken::new(),
                outcome: OnceLock::new(),
                name: RwLock::new(name.into()),
            }),
        }
    }

    /// Record the outcome and release waiters
    ///
    /// Returns `false` when the probe had already been signalled.
    pub fn signal(&self, error: Option<Error>) -> bool {
        if self.inner.outcome.set(error).is_err() {
            return false;
        }
        self.inner.fired.cancel();
        true
    }

    /// Wait until the probe is signalled
    pub async fn done(&self) {
        self.inner.fired.cancelled().await;
    }

    /// Whether the probe has been signalled
    pub fn is_done(&self) -> bool {
        self.inner.fired.is_cancelled()
    }

    /// Error the probe was signalled with
    pub fn error(&self) -> Option<Error> {
        self.inner.outcome.get().cloned().flatten()
    }

    /// Display name, empty when unnamed
    pub fn name(&self) -> String {
        lock_rwlock_read(&self.inner.name, "readiness probe name")
            .map(|name| name.clone())
            .unwrap_or_default()
    }

    /// Rename the probe (shared by every clone)
    pub fn set_name(&self, name: impl Into<String>) -> Result<()> {
        *lock_rwlock_write(&self.inner.name, "readiness probe name")? = name.into();
        Ok(())
    }
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReadinessProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessProbe")
            .field("name", &self.name())
            .field("done", &self.is_done())
            .finish()
    }
}

#[async_trait]
impl Readiness for ReadinessProbe {
    async fn wait(&self) -> Result<()> {
        self.done().await;
        match self.error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn name(&self) -> String {
        ReadinessProbe::name(self)
    }
}
