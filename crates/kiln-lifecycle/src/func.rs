//! Closure-backed actors and services
//!
//! | Type | Start | Stop | Service |
//! |------|-------|------|---------|
//! | [`FuncActor`] | optional closure | optional closure | no |
//! | [`FuncService`] | spawns the task once | cancels, runs closure, waits | yes |
//!
//! ## Usage
//!
//! ```ignore
//! let migrate = FuncActor::new()
//!     .with_start(|_token| async { run_migrations().await })
//!     .with_name("migrations");
//!
//! let worker = FuncService::new(|token| async move {
//!     token.cancelled().await;
//!     Ok(())
//! })
//! .with_name("worker");
//! ```

use async_trait::async_trait;
use futures::future::BoxFuture;
use kiln_domain::constants::{STAGE_DEFAULT, STAGE_READINESS};
use kiln_domain::locks::lock_mutex;
use kiln_domain::{Actor, Error, Readiness, Result, Service};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::readiness::ReadinessProbe;

/// Boxed future returned by actor closures
pub type ActorFuture = BoxFuture<'static, Result<()>>;

type StartFn = Box<dyn Fn(CancellationToken) -> ActorFuture + Send + Sync>;
type StopFn = Box<dyn Fn() -> ActorFuture + Send + Sync>;
type TaskFn = Box<dyn FnOnce(CancellationToken) -> ActorFuture + Send>;

fn box_stop<F, Fut>(stop: F) -> StopFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Box::new(move || Box::pin(stop()))
}

// ============================================================================
// FuncActor
// ============================================================================

/// Actor built from optional start and stop closures
///
/// An actor with only a stop closure reports `requires_stop`, so it is
/// stopped during shutdown even though it was never started.
#[derive(Default)]
pub struct FuncActor {
    start: Option<StartFn>,
    stop: Option<StopFn>,
    name: Option<String>,
    stage: Option<i64>,
    probe: Option<ReadinessProbe>,
}

impl FuncActor {
    /// Actor with neither start nor stop
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start closure
    #[must_use]
    pub fn with_start<F, Fut>(mut self, start: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.start = Some(Box::new(move |token| Box::pin(start(token))));
        self
    }

    /// Set the stop closure
    #[must_use]
    pub fn with_stop<F, Fut>(mut self, stop: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.stop = Some(box_stop(stop));
        self
    }

    /// Set the display name; also renames the readiness probe
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if let Some(probe) = &self.probe {
            if let Err(err) = probe.set_name(name.clone()) {
                warn!(error = %err, "could not rename readiness probe");
            }
        }
        self.name = Some(name);
        self
    }

    /// Set the stage explicitly
    #[must_use]
    pub fn with_stage(mut self, stage: i64) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Attach a readiness probe signalled once start returns
    ///
    /// Without an explicit stage the actor moves to `STAGE_READINESS`, so
    /// it starts after everything it reports readiness for.
    #[must_use]
    pub fn with_readiness(mut self) -> Self {
        if self.probe.is_none() {
            self.probe = Some(ReadinessProbe::named(self.name.clone().unwrap_or_default()));
        }
        self
    }

    /// Readiness probe, if enabled
    pub fn probe(&self) -> Option<&ReadinessProbe> {
        self.probe.as_ref()
    }
}

#[async_trait]
impl Actor for FuncActor {
    async fn start(&self, token: &CancellationToken) -> Result<()> {
        let result = match &self.start {
            Some(start) => start(token.clone()).await,
            None => Ok(()),
        };
        if let Some(probe) = &self.probe {
            probe.signal(result.as_ref().err().cloned());
        }
        result
    }

    async fn stop(&self) -> Result<()> {
        match &self.stop {
            Some(stop) => stop().await,
            None => Ok(()),
        }
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn stage(&self) -> i64 {
        match (self.stage, &self.probe) {
            (Some(stage), _) => stage,
            (None, Some(_)) => STAGE_READINESS,
            (None, None) => STAGE_DEFAULT,
        }
    }

    fn requires_stop(&self) -> bool {
        self.start.is_none() && self.stop.is_some()
    }

    fn readiness(&self) -> Option<Arc<dyn Readiness>> {
        self.probe
            .clone()
            .map(|probe| Arc::new(probe) as Arc<dyn Readiness>)
    }
}

// ============================================================================
// FuncService
// ============================================================================

/// Service running one task in the background
///
/// The task is spawned on the first `start`; later starts are no-ops.
/// `stop` cancels the task token, runs the stop closure, then waits for
/// the task to return. A task that fails after stop was requested counts
/// as a clean exit.
pub struct FuncService {
    task: Mutex<Option<TaskFn>>,
    stop: Option<StopFn>,
    name: Option<String>,
    token: CancellationToken,
    finished: CancellationToken,
    outcome: Arc<OnceLock<Option<Error>>>,
    started: AtomicBool,
}

impl FuncService {
    /// Service running `task` until it returns or its token is cancelled
    pub fn new<F, Fut>(task: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let task: TaskFn = Box::new(move |token| Box::pin(task(token)));
        Self {
            task: Mutex::new(Some(task)),
            stop: None,
            name: None,
            token: CancellationToken::new(),
            finished: CancellationToken::new(),
            outcome: Arc::new(OnceLock::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Set a closure run by `stop` before waiting for the task
    #[must_use]
    pub fn with_stop<F, Fut>(mut self, stop: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.stop = Some(box_stop(stop));
        self
    }

    /// Set the display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether `start` has been called
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn spawn(&self, task: TaskFn) {
        let token = self.token.clone();
        let finished = self.finished.clone();
        let outcome = Arc::clone(&self.outcome);
        let name = self.name.clone().unwrap_or_default();

        let handle = tokio::spawn(task(token.clone()));
        tokio::spawn(async move {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(Error::internal(format!("service task aborted: {join_err}"))),
            };
            let error = match result {
                Ok(()) => None,
                Err(err) if token.is_cancelled() => {
                    debug!(service = %name, error = %err, "service task failed after stop request");
                    None
                }
                Err(err) => Some(err),
            };
            let _ = outcome.set(error);
            token.cancel();
            finished.cancel();
        });
    }
}

impl std::fmt::Debug for FuncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuncService")
            .field("name", &self.name)
            .field("started", &self.is_started())
            .field("finished", &self.finished.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Actor for FuncService {
    async fn start(&self, _token: &CancellationToken) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let task = lock_mutex(&self.task, "func service task")?.take();
        if let Some(task) = task {
            self.spawn(task);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.token.cancel();
        if let Some(stop) = &self.stop {
            stop().await?;
        }
        if self.is_started() {
            self.finished.cancelled().await;
        }
        Ok(())
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn into_service(self: Arc<Self>) -> Option<Arc<dyn Service>> {
        Some(self)
    }
}

#[async_trait]
impl Service for FuncService {
    async fn done(&self) {
        self.finished.cancelled().await;
    }

    fn err(&self) -> Option<Error> {
        self.outcome.get().cloned().flatten()
    }
}
