//! Demo Initialization
//!
//! Loads configuration, installs logging and serves a small lifecycle:
//!
//! | Binding | Role |
//! |---------|------|
//! | `Arc<HeartbeatSettings>` | interval taken from the command line |
//! | `Arc<FuncService>` | logs a heartbeat until stopped |
//! | `Arc<FuncActor>` | readiness gate started after the heartbeat |
//!
//! Ctrl-C cancels the serve token, which is a graceful shutdown.

use kiln_domain::{Result, Service};
use kiln_infrastructure::config::{AppConfig, ConfigLoader};
use kiln_infrastructure::logging::init_logging;
use kiln_inject::Module;
use kiln_lifecycle::{ActorRegistry, FuncActor, FuncService, Lifecycle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Heartbeat interval
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatSettings {
    /// Time between two heartbeats
    pub interval: Duration,
}

/// Load configuration, install logging and serve until Ctrl-C
pub async fn run(config_path: Option<&Path>, heartbeat: Duration) -> Result<()> {
    let config = load_config(config_path)?;
    init_logging(&config.logging)?;

    let lifecycle = Lifecycle::from_module(demo_module(heartbeat))?;
    config.lifecycle.apply_to(&lifecycle)?;

    info!(
        lifecycle = %config.lifecycle.name,
        heartbeat_ms = heartbeat.as_millis(),
        "Starting kiln"
    );

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                shutdown.cancel();
            }
            Err(err) => warn!(error = %err, "Cannot listen for Ctrl-C"),
        }
    });

    lifecycle.serve(token).await
}

/// Load configuration from optional path
fn load_config(config_path: Option<&Path>) -> Result<AppConfig> {
    let loader = match config_path {
        Some(path) => ConfigLoader::new().with_config_path(path),
        None => ConfigLoader::new(),
    };
    loader.load()
}

/// Constructors for the heartbeat service and its readiness gate
pub fn demo_module(interval: Duration) -> Module {
    Module::new()
        .provide(move || Arc::new(HeartbeatSettings { interval }))
        .provide(
            |registry: Arc<ActorRegistry>, settings: Arc<HeartbeatSettings>| -> Result<Arc<FuncService>> {
                let interval = settings.interval;
                registry.register(Arc::new(
                    FuncService::new(move |token| beat(token, interval)).with_name("heartbeat"),
                ))
            },
        )
        .provide(
            |registry: Arc<ActorRegistry>, heartbeat: Arc<FuncService>| -> Result<Arc<FuncActor>> {
                let gate = FuncActor::new()
                    .with_name("heartbeat-ready")
                    .with_start(move |_token| {
                        let heartbeat = Arc::clone(&heartbeat);
                        async move {
                            match heartbeat.err() {
                                Some(err) => Err(err),
                                None => Ok(()),
                            }
                        }
                    })
                    .with_readiness();
                registry.register(Arc::new(gate))
            },
        )
}

async fn beat(token: CancellationToken, interval: Duration) -> Result<()> {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    let mut beats: u64 = 0;
    loop {
        tokio::select! {
            () = token.cancelled() => {
                info!(beats, "Heartbeat stopped");
                return Ok(());
            }
            _ = ticker.tick() => {
                beats += 1;
                info!(beats, "Heartbeat");
            }
        }
    }
}
