//! Field injection
//!
//! Types that want dependencies injected into an existing value implement
//! [`Injectable`]. The `inject` hook pulls each field through a
//! [`FieldInjector`]; `declare_fields` lists the same requirements up front
//! so registration-time cycle detection can see them.
//!
//! ```ignore
//! struct Handler {
//!     db: Option<Arc<Db>>,
//!     cache: Option<Arc<Cache>>,
//! }
//!
//! impl Injectable for Handler {
//!     fn declare_fields(fields: &mut FieldSet) {
//!         fields.required::<Db>().optional::<Cache>();
//!     }
//!
//!     fn inject(&mut self, injector: &mut FieldInjector<'_>) -> Result<()> {
//!         self.db = Some(injector.required()?);
//!         self.cache = injector.optional()?;
//!         Ok(())
//!     }
//! }
//! ```

use crate::container::Container;
use crate::dependency::ResolveContext;
use kiln_domain::{Result, TypeKey};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One declared field requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDependency {
    /// Single binding the field receives
    pub key: TypeKey,
    /// Whether a missing binding leaves the field unset
    pub optional: bool,
}

/// Collector for [`Injectable::declare_fields`]
#[derive(Debug, Default)]
pub struct FieldSet {
    fields: Vec<FieldDependency>,
}

impl FieldSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Declare a required field of type `Arc<T>`
    pub fn required<T: ?Sized + 'static>(&mut self) -> &mut Self {
        self.fields.push(FieldDependency {
            key: TypeKey::single::<T>(),
            optional: false,
        });
        self
    }

    /// Declare an optional field of type `Option<Arc<T>>`
    pub fn optional<T: ?Sized + 'static>(&mut self) -> &mut Self {
        self.fields.push(FieldDependency {
            key: TypeKey::single::<T>(),
            optional: true,
        });
        self
    }

    pub(crate) fn into_vec(self) -> Vec<FieldDependency> {
        self.fields
    }
}

/// A type whose fields the container can fill in
pub trait Injectable: Send + Sync + 'static {
    /// Declare the fields `inject` will resolve
    fn declare_fields(_fields: &mut FieldSet) {}

    /// Resolve and assign the fields
    fn inject(&mut self, injector: &mut FieldInjector<'_>) -> Result<()>;
}

/// Handle passed to [`Injectable::inject`]
pub struct FieldInjector<'a> {
    container: &'a Container,
    cx: &'a ResolveContext,
}

impl<'a> FieldInjector<'a> {
    pub(crate) fn new(container: &'a Container, cx: &'a ResolveContext) -> Self {
        Self { container, cx }
    }

    /// Resolve a field that must be provided
    pub fn required<T>(&mut self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.container.resolve_single_in::<T>(self.cx)
    }

    /// Resolve a field that stays unset when its type is not provided
    pub fn optional<T>(&mut self) -> Result<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.container.resolve_single_in::<T>(self.cx) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_provided() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Token of the running resolution
    pub fn token(&self) -> CancellationToken {
        self.cx.token().clone()
    }
}
