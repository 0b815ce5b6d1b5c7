//! # Kiln Lifecycle
//!
//! Coordinates construction, staged startup, readiness gating, service
//! monitoring and bounded shutdown of a set of actors.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`lifecycle`] | The [`Lifecycle`] orchestrator |
//! | [`registry`] | Sealable [`ActorRegistry`] bound in the container |
//! | [`readiness`] | Fire-once [`ReadinessProbe`] |
//! | [`func`] | Closure-backed [`FuncActor`] and [`FuncService`] |
//!
//! The capability traits live in `kiln_domain::ports` and are re-exported
//! here.

pub mod func;
pub mod lifecycle;
pub mod readiness;
pub mod registry;

pub use func::{ActorFuture, FuncActor, FuncService};
pub use kiln_domain::{Actor, Readiness, Service};
pub use lifecycle::{Lifecycle, serve};
pub use readiness::ReadinessProbe;
pub use registry::ActorRegistry;
