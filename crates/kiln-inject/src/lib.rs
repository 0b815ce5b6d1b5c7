//! # Kiln Inject
//!
//! Type-keyed dependency injection with lazy, memoised resolution.
//!
//! Constructors are plain functions whose parameters are dependencies and
//! whose return type names the bindings they own. The graph is checked for
//! cycles when constructors are registered, so a bad graph fails before any
//! constructor runs.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`container`] | Registration, resolution, build, invoke and apply |
//! | [`constructor`] | `Constructor`/`Invocable` traits and [`Module`] batches |
//! | [`dependency`] | Parameter kinds and the resolution context |
//! | [`output`] | Return-type kinds, including [`Injected`] |
//! | [`element`] | Multi-binding with [`Element`] and [`Collected`] |
//! | [`inject`] | Field injection through [`Injectable`] |
//!
//! ## Example
//!
//! ```ignore
//! use kiln_inject::{Collected, Container, Element};
//! use std::sync::Arc;
//!
//! let container = Container::new();
//! container.provide(|| Arc::new(Settings::default()))?;
//! container.provide(|s: Arc<Settings>| Element::of(Route::new("/health", &s)))?;
//! container.provide(|s: Arc<Settings>| Element::of(Route::new("/metrics", &s)))?;
//! container.provide(|routes: Collected<Route>| Arc::new(Router::new(routes.into_vec())))?;
//!
//! let router: Arc<Router> = container.resolve()?;
//! ```

pub mod constructor;
pub mod container;
mod cycle;
pub mod dependency;
pub mod element;
pub mod inject;
pub mod output;

pub use constructor::{Constructor, Invocable, Module, ProviderSpec};
pub use container::Container;
pub use dependency::{Dependency, Requirement, ResolveContext};
pub use element::{Collected, Element, Void};
pub use inject::{FieldDependency, FieldInjector, FieldSet, Injectable};
pub use output::{AnyValue, Injected, Output, OutputContext, OutputSpec, Outputs};
