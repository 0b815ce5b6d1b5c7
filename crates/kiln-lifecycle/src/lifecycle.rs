//! Lifecycle Orchestration
//!
//! A [`Lifecycle`] owns a [`Container`] and an [`ActorRegistry`] and drives
//! them through one complete run.
//!
//! ## Phases
//!
//! ```text
//!   build ──→ start (by stage) ──→ readiness ──→ monitor ──→ stop (reverse)
//!     │            │                   │            │             ▲
//!     │            └── first failure ──┴── probe ───┘             │
//!     └──────────────────── any error or completion ──────────────┘
//! ```
//!
//! | Phase | Behavior |
//! |-------|----------|
//! | Build | every pending constructor runs in registration order |
//! | Start | actors start one by one, stable-sorted by stage |
//! | Readiness | every probe is awaited concurrently |
//! | Monitor | the first service to finish decides the outcome |
//! | Stop | started actors (and `requires_stop` ones) stop in reverse order |
//!
//! Stops are bounded by a per-actor timeout nested in one global deadline.
//! Stop failures are logged, never returned.
//!
//! ## Usage
//!
//! ```ignore
//! let lifecycle = Lifecycle::new()?;
//! lifecycle.provide(|registry: Arc<ActorRegistry>| -> Result<Arc<FuncService>> {
//!     registry.register(Arc::new(FuncService::new(run_worker)))
//! })?;
//! lifecycle.serve(CancellationToken::new()).await?;
//! ```

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use kiln_domain::constants::{DEFAULT_LIFECYCLE_NAME, DEFAULT_STOP_EACH_TIMEOUT, DEFAULT_STOP_TIMEOUT};
use kiln_domain::locks::{lock_rwlock_read, lock_rwlock_write};
use kiln_domain::{Actor, Error, Readiness, Result, Service};
use kiln_inject::{Collected, Constructor, Container, Module};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::func::FuncService;
use crate::readiness::ReadinessProbe;
use crate::registry::ActorRegistry;

#[derive(Debug, Clone)]
struct Settings {
    name: String,
    stop_timeout: Duration,
    stop_each_timeout: Duration,
}

/// How the readiness phase ended
enum Gate {
    Ready,
    /// A service finished before every probe fired
    Finished(Result<()>),
}

/// Container plus actors, driven through build, start, monitor and stop
pub struct Lifecycle {
    container: Arc<Container>,
    registry: Arc<ActorRegistry>,
    settings: RwLock<Settings>,
    served: AtomicBool,
    probe: ReadinessProbe,
    /// Runs `serve` in the background for `start`
    runner: FuncService,
}

// ============================================================================
// Construction and configuration
// ============================================================================

impl Lifecycle {
    /// Lifecycle with an empty container and default timeouts
    pub fn new() -> Result<Arc<Self>> {
        let container = Arc::new(Container::new());
        let registry = Arc::new(ActorRegistry::new());
        let bound = Arc::clone(&registry);
        container.provide(move || Arc::clone(&bound))?;

        Ok(Arc::new_cyclic(|weak: &Weak<Lifecycle>| {
            let weak = weak.clone();
            let runner = FuncService::new(move |token| async move {
                match weak.upgrade() {
                    Some(lifecycle) => lifecycle.serve(token).await,
                    None => Ok(()),
                }
            })
            .with_name(DEFAULT_LIFECYCLE_NAME);

            Lifecycle {
                container,
                registry,
                settings: RwLock::new(Settings {
                    name: DEFAULT_LIFECYCLE_NAME.to_string(),
                    stop_timeout: DEFAULT_STOP_TIMEOUT,
                    stop_each_timeout: DEFAULT_STOP_EACH_TIMEOUT,
                }),
                served: AtomicBool::new(false),
                probe: ReadinessProbe::named(DEFAULT_LIFECYCLE_NAME),
                runner,
            }
        }))
    }

    /// New lifecycle with `module` registered
    pub fn from_module(module: Module) -> Result<Arc<Self>> {
        let lifecycle = Self::new()?;
        lifecycle.provide_module(module)?;
        Ok(lifecycle)
    }

    /// New lifecycle with `module` registered, started in the background
    ///
    /// Returns once every actor has started and every probe has fired.
    pub async fn start_module(token: &CancellationToken, module: Module) -> Result<Arc<Self>> {
        let lifecycle = Self::from_module(module)?;
        lifecycle.start(token).await?;
        Ok(lifecycle)
    }

    /// Rename the lifecycle and its readiness probe
    pub fn with_name(&self, name: impl Into<String>) -> Result<&Self> {
        let name = name.into();
        self.probe.set_name(name.clone())?;
        lock_rwlock_write(&self.settings, "lifecycle settings")?.name = name;
        Ok(self)
    }

    /// Global deadline for the stop phase
    pub fn with_stop_timeout(&self, timeout: Duration) -> Result<&Self> {
        lock_rwlock_write(&self.settings, "lifecycle settings")?.stop_timeout = timeout;
        Ok(self)
    }

    /// Deadline for each actor's stop
    pub fn with_stop_each_timeout(&self, timeout: Duration) -> Result<&Self> {
        lock_rwlock_write(&self.settings, "lifecycle settings")?.stop_each_timeout = timeout;
        Ok(self)
    }

    fn settings(&self) -> Settings {
        match lock_rwlock_read(&self.settings, "lifecycle settings") {
            Ok(settings) => settings.clone(),
            Err(err) => {
                warn!(error = %err, "using default lifecycle settings");
                Settings {
                    name: DEFAULT_LIFECYCLE_NAME.to_string(),
                    stop_timeout: DEFAULT_STOP_TIMEOUT,
                    stop_each_timeout: DEFAULT_STOP_EACH_TIMEOUT,
                }
            }
        }
    }

    /// The lifecycle's container
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// The lifecycle's actor registry
    pub fn registry(&self) -> &Arc<ActorRegistry> {
        &self.registry
    }

    /// Probe signalled once the start phase and readiness gating finish
    pub fn readiness_probe(&self) -> &ReadinessProbe {
        &self.probe
    }

    /// Whether `serve` (directly or through `start`) has begun
    pub fn is_served(&self) -> bool {
        self.served.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Registration
// ============================================================================

impl Lifecycle {
    /// Register an actor
    pub fn add(&self, actor: Arc<dyn Actor>) -> Result<()> {
        self.registry.add(actor)
    }

    /// Register one constructor in the container
    pub fn provide<C, Args>(&self, constructor: C) -> Result<()>
    where
        C: Constructor<Args>,
        Args: 'static,
    {
        self.provide_module(Module::new().provide(constructor))
    }

    /// Register a module in the container
    pub fn provide_module(&self, module: Module) -> Result<()> {
        if self.is_served() {
            return Err(Error::AlreadyServed);
        }
        self.container.provide_module(module)
    }
}

// ============================================================================
// Serve
// ============================================================================

impl Lifecycle {
    /// Run the full lifecycle until a service finishes or `token` is cancelled
    ///
    /// Returns `Ok` on caller cancellation and on clean service completion.
    /// Only one call per lifecycle is allowed.
    pub async fn serve(&self, token: CancellationToken) -> Result<()> {
        self.serve_with(token, Module::new()).await
    }

    /// Register `module`, then [`Lifecycle::serve`]
    pub async fn serve_with(&self, token: CancellationToken, module: Module) -> Result<()> {
        if self
            .served
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyServed);
        }

        let mut started = Vec::new();
        let result = self.run(&token, module, &mut started).await;
        self.cleanup(&started).await;
        self.probe.signal(result.as_ref().err().cloned());

        let name = self.settings().name;
        match &result {
            Ok(()) => info!(lifecycle = %name, "Lifecycle completed"),
            Err(err) => error!(lifecycle = %name, error = %err, "Lifecycle failed"),
        }
        result
    }

    async fn run(
        &self,
        token: &CancellationToken,
        module: Module,
        started: &mut Vec<Arc<dyn Actor>>,
    ) -> Result<()> {
        self.container.build_module_with(token.clone(), module)?;
        self.registry.seal()?;

        let actors = sorted_by_stage(self.registry.snapshot()?);
        let services = collect_services(&actors);
        if services.is_empty() {
            return Err(Error::NoServices);
        }

        let name = self.settings().name;
        info!(
            lifecycle = %name,
            actor_count = actors.len(),
            service_count = services.len(),
            "Starting lifecycle"
        );

        for (index, actor) in actors.iter().enumerate() {
            let label = actor_name(actor.as_ref(), index);
            debug!(actor = %label, stage = actor.stage(), "Actor starting");
            if let Err(err) = actor.start(token).await {
                error!(actor = %label, error = %err, "Failed to start actor");
                return Err(Error::actor_start(label, err));
            }
            started.push(Arc::clone(actor));
            debug!(actor = %label, "Actor started successfully");
        }
        info!(actor_count = actors.len(), "All actors started successfully");

        match self.await_readiness(token, &actors, &services).await? {
            Gate::Ready => {
                self.probe.signal(None);
                debug!(lifecycle = %name, "Lifecycle ready");
            }
            Gate::Finished(outcome) => return outcome,
        }

        self.monitor(token, services).await
    }

    async fn await_readiness(
        &self,
        token: &CancellationToken,
        actors: &[Arc<dyn Actor>],
        services: &[(String, Arc<dyn Service>)],
    ) -> Result<Gate> {
        let mut probes: Vec<Arc<dyn Readiness>> = Vec::new();
        match self
            .container
            .resolve_with::<Collected<ReadinessProbe>>(token.clone())
        {
            Ok(collected) => {
                probes.extend(collected.into_iter().map(|p| p as Arc<dyn Readiness>));
            }
            Err(err) if err.is_not_provided() => {}
            Err(err) => return Err(err),
        }
        probes.extend(actors.iter().filter_map(|actor| actor.readiness()));
        if probes.is_empty() {
            return Ok(Gate::Ready);
        }

        let mut waits: FuturesUnordered<_> = probes
            .iter()
            .enumerate()
            .map(|(index, probe)| async move {
                let mut probe_name = probe.name();
                if probe_name.is_empty() {
                    probe_name = format!("probe[{index}]");
                }
                debug!(probe = %probe_name, "Waiting for readiness probe");
                match probe.wait().await {
                    Ok(()) => {
                        debug!(probe = %probe_name, "Readiness probe signaled ready");
                        Ok(())
                    }
                    Err(err) => {
                        error!(probe = %probe_name, error = %err, "Readiness probe failed");
                        Err(err)
                    }
                }
            })
            .collect();
        let all_ready = async {
            while let Some(result) = waits.next().await {
                result?;
            }
            Ok::<(), Error>(())
        };

        let mut completions: FuturesUnordered<_> = services
            .iter()
            .map(|(name, service)| async move {
                service.done().await;
                (name, service)
            })
            .collect();

        tokio::select! {
            biased;
            ready = all_ready => ready.map(|()| Gate::Ready),
            () = token.cancelled() => Err(Error::Cancelled),
            Some((name, service)) = completions.next() => {
                let outcome = match service.err() {
                    Some(err) => Err(err),
                    None => Ok(()),
                };
                warn!(actor = %name, "Service finished before readiness");
                Ok(Gate::Finished(outcome))
            }
        }
    }

    async fn monitor(
        &self,
        token: &CancellationToken,
        services: Vec<(String, Arc<dyn Service>)>,
    ) -> Result<()> {
        let monitor_token = token.child_token();
        let service_count = services.len();
        let mut tasks = JoinSet::new();
        for (name, service) in services {
            let cancelled = monitor_token.clone();
            tasks.spawn(async move {
                tokio::select! {
                    () = service.done() => match service.err() {
                        Some(err) => {
                            error!(actor = %name, error = %err, "Service completed with error");
                            Err(err)
                        }
                        None => {
                            info!(actor = %name, "Service completed successfully");
                            Ok(())
                        }
                    },
                    () = cancelled.cancelled() => {
                        debug!(actor = %name, "Service monitoring cancelled");
                        Ok(())
                    }
                }
            });
        }
        info!(service_count, "Monitoring services");

        let outcome = match tasks.join_next().await {
            Some(Ok(result)) => result,
            Some(Err(join_err)) => Err(Error::internal(format!(
                "service monitor aborted: {join_err}"
            ))),
            None => Ok(()),
        };
        monitor_token.cancel();
        while tasks.join_next().await.is_some() {}
        outcome
    }

    async fn cleanup(&self, started: &[Arc<dyn Actor>]) {
        if let Err(err) = self.registry.seal() {
            warn!(error = %err, "could not seal actor registry");
        }
        let actors = match self.registry.snapshot() {
            Ok(actors) => sorted_by_stage(actors),
            Err(err) => {
                error!(error = %err, "could not list actors for cleanup");
                return;
            }
        };
        let settings = self.settings();
        let deadline = Instant::now() + settings.stop_timeout;

        for (index, actor) in actors.iter().enumerate().rev() {
            let was_started = started
                .iter()
                .any(|s| std::ptr::addr_eq(Arc::as_ptr(s), Arc::as_ptr(actor)));
            if !was_started && !actor.requires_stop() {
                continue;
            }

            let label = actor_name(actor.as_ref(), index);
            let budget = settings
                .stop_each_timeout
                .min(deadline.saturating_duration_since(Instant::now()));
            match tokio::time::timeout(budget, actor.stop()).await {
                Ok(Ok(())) => debug!(actor = %label, "Actor stopped successfully during cleanup"),
                Ok(Err(err)) => {
                    error!(actor = %label, error = %err, "Failed to stop actor during cleanup");
                }
                Err(_) => {
                    let err = Error::actor_stop(
                        label.clone(),
                        Error::timeout(format!("stop after {}ms", budget.as_millis())),
                    );
                    error!(actor = %label, error = %err, "Timed out stopping actor during cleanup");
                }
            }
        }
    }
}

// ============================================================================
// Start (background serve)
// ============================================================================

impl Lifecycle {
    /// Build, serve in the background, and wait until ready
    ///
    /// `token` bounds the wait only; use `stop` to end the background run.
    pub async fn start(&self, token: &CancellationToken) -> Result<()> {
        let result = self.start_inner(token).await;
        if let Err(err) = &result {
            self.probe.signal(Some(err.clone()));
        }
        result
    }

    async fn start_inner(&self, token: &CancellationToken) -> Result<()> {
        self.container.build_with(token.clone())?;
        let actors = self.registry.snapshot()?;
        if collect_services(&actors).is_empty() {
            return Err(Error::NoServices);
        }

        self.runner.start(token).await?;

        tokio::select! {
            biased;
            () = self.probe.done() => match self.probe.error() {
                Some(err) => Err(err),
                None => Ok(()),
            },
            () = self.runner.done() => match self.runner.err() {
                Some(err) => Err(err),
                None => Ok(()),
            },
            () = token.cancelled() => Err(Error::Cancelled),
        }
    }
}

#[async_trait]
impl Actor for Lifecycle {
    async fn start(&self, token: &CancellationToken) -> Result<()> {
        Lifecycle::start(self, token).await
    }

    async fn stop(&self) -> Result<()> {
        self.runner.stop().await
    }

    fn name(&self) -> Option<String> {
        Some(self.settings().name)
    }

    fn requires_stop(&self) -> bool {
        true
    }

    fn into_service(self: Arc<Self>) -> Option<Arc<dyn Service>> {
        Some(self)
    }

    fn readiness(&self) -> Option<Arc<dyn Readiness>> {
        Some(Arc::new(self.probe.clone()))
    }
}

#[async_trait]
impl Service for Lifecycle {
    async fn done(&self) {
        self.runner.done().await;
    }

    fn err(&self) -> Option<Error> {
        self.runner.err()
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("settings", &self.settings())
            .field("served", &self.is_served())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Create a lifecycle from `module` and serve it
pub async fn serve(token: CancellationToken, module: Module) -> Result<()> {
    Lifecycle::new()?.serve_with(token, module).await
}

// ============================================================================
// Helpers
// ============================================================================

fn sorted_by_stage(mut actors: Vec<Arc<dyn Actor>>) -> Vec<Arc<dyn Actor>> {
    actors.sort_by_key(|actor| actor.stage());
    actors
}

fn collect_services(actors: &[Arc<dyn Actor>]) -> Vec<(String, Arc<dyn Service>)> {
    actors
        .iter()
        .enumerate()
        .filter_map(|(index, actor)| {
            Arc::clone(actor)
                .into_service()
                .map(|service| (actor_name(actor.as_ref(), index), service))
        })
        .collect()
}

/// Display name, falling back to `[index](Type)`
fn actor_name(actor: &dyn Actor, index: usize) -> String {
    match actor.name() {
        Some(name) if !name.is_empty() => name,
        _ => format!("[{index}]({})", actor.type_name()),
    }
}
