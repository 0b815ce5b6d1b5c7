//! Multi-binding types
//!
//! A constructor that returns [`Element<T>`] contributes one entry to the
//! collected sequence of `T` instead of claiming the single binding of
//! `Arc<T>`. Any number of constructors may contribute; a dependency on
//! [`Collected<T>`] receives every contribution in registration order,
//! parent container entries first.
//!
//! ```text
//! provide(|| Element::new(Arc::new(RouteA)))   ─┐
//! provide(|| Element::new(Arc::new(RouteB)))   ─┼─→ Collected<RouteA | RouteB>
//! parent: provide(|| Element::new(...))        ─┘    (parent entries first)
//! ```

use kiln_domain::TypeKey;
use std::any::TypeId;
use std::ops::Deref;
use std::sync::Arc;

/// One contribution to the collected sequence of `T`
pub struct Element<T: ?Sized> {
    value: Arc<T>,
}

impl<T: ?Sized> Element<T> {
    /// Wrap a shared value as a contribution
    pub fn new(value: Arc<T>) -> Self {
        Self { value }
    }

    /// Contributed value
    pub fn value(&self) -> &Arc<T> {
        &self.value
    }

    /// Unwrap the contributed value
    pub fn into_inner(self) -> Arc<T> {
        self.value
    }
}

impl<T> Element<T> {
    /// Wrap an owned value as a contribution
    pub fn of(value: T) -> Self {
        Self::new(Arc::new(value))
    }
}

impl<T: ?Sized> Clone for Element<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for Element<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

/// Every contribution to `T`, in registration order
pub struct Collected<T: ?Sized> {
    items: Vec<Arc<T>>,
}

impl<T: ?Sized> Collected<T> {
    pub(crate) fn new(items: Vec<Arc<T>>) -> Self {
        Self { items }
    }

    /// Unwrap into the underlying vector
    pub fn into_vec(self) -> Vec<Arc<T>> {
        self.items
    }
}

impl<T: ?Sized> Deref for Collected<T> {
    type Target = [Arc<T>];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<T: ?Sized> Clone for Collected<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T: ?Sized> IntoIterator for Collected<T> {
    type Item = Arc<T>;
    type IntoIter = std::vec::IntoIter<Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<T: ?Sized> std::fmt::Debug for Collected<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collected")
            .field("type", &std::any::type_name::<T>())
            .field("len", &self.items.len())
            .finish()
    }
}

/// Marker produced by side-effect-only constructors
///
/// A constructor returning `()` (or `Result<(), E>`) is registered as a
/// contribution of `Element<Void>`, so `build` runs it exactly once.
/// Resolving `Collected<Void>` runs every pending one explicitly. `Void`
/// cannot be bound or requested as a single type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Void;

/// Whether `key` names the reserved [`Void`] marker
pub(crate) fn is_void(key: &TypeKey) -> bool {
    key.id() == TypeId::of::<Void>()
}
