//! Constructor inputs
//!
//! Every constructor parameter implements [`Dependency`]. The trait serves
//! two purposes: it declares the [`Requirement`] used as a graph edge during
//! cycle detection, and it resolves the concrete value at construction time.
//!
//! | Parameter | Requirement | Resolution |
//! |-----------|-------------|------------|
//! | `Arc<T>` | `Single(T)` | memoised single binding, error when missing |
//! | `Option<Arc<T>>` | `Optional(T)` | `None` when the type is not provided |
//! | `Collected<T>` | `Collected(T)` | every `Element<T>` contribution |
//! | `CancellationToken` | `Context` | passed through, never resolved |
//! | `(A, B, ...)` | each member | each member |

use crate::container::Container;
use crate::element::Collected;
use kiln_domain::{DependencyPath, ProviderKey, Result, TypeKey};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Explicit accumulator threaded through one resolution
///
/// Carries the cancellation token handed to context parameters and the
/// chain of keys visited so far, used to annotate missing-type errors.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    token: CancellationToken,
    path: DependencyPath,
}

impl ResolveContext {
    /// Root context carrying `token`
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            path: DependencyPath::new(),
        }
    }

    /// Token passed to context parameters
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Keys traversed so far
    pub fn path(&self) -> &DependencyPath {
        &self.path
    }

    /// Context one level deeper, at `key`
    pub(crate) fn enter(&self, key: ProviderKey) -> Self {
        Self {
            token: self.token.clone(),
            path: self.path.with(key),
        }
    }
}

/// Declared need of a constructor parameter or injected field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Context parameter; excluded from the dependency graph
    Context,
    /// Required single binding
    Single(TypeKey),
    /// Single binding that may be absent
    Optional(TypeKey),
    /// Every contribution of the given element type
    Collected(TypeKey),
}

impl Requirement {
    /// Type the requirement points at, if it is part of the graph
    pub fn type_key(&self) -> Option<TypeKey> {
        match self {
            Self::Context => None,
            Self::Single(key) | Self::Optional(key) | Self::Collected(key) => Some(*key),
        }
    }
}

/// A value a constructor can ask the container for
pub trait Dependency: Sized + Send + 'static {
    /// Append the requirements this parameter introduces
    fn requirements(out: &mut Vec<Requirement>);

    /// Produce the value from `container`
    fn resolve(container: &Container, cx: &ResolveContext) -> Result<Self>;
}

impl<T> Dependency for Arc<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn requirements(out: &mut Vec<Requirement>) {
        out.push(Requirement::Single(TypeKey::single::<T>()));
    }

    fn resolve(container: &Container, cx: &ResolveContext) -> Result<Self> {
        container.resolve_single_in::<T>(cx)
    }
}

impl<T> Dependency for Option<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn requirements(out: &mut Vec<Requirement>) {
        out.push(Requirement::Optional(TypeKey::single::<T>()));
    }

    fn resolve(container: &Container, cx: &ResolveContext) -> Result<Self> {
        match container.resolve_single_in::<T>(cx) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_provided() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl<T> Dependency for Collected<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn requirements(out: &mut Vec<Requirement>) {
        out.push(Requirement::Collected(TypeKey::element::<T>()));
    }

    fn resolve(container: &Container, cx: &ResolveContext) -> Result<Self> {
        container
            .resolve_elements_in::<T>(cx)
            .map(Collected::new)
    }
}

impl Dependency for CancellationToken {
    fn requirements(out: &mut Vec<Requirement>) {
        out.push(Requirement::Context);
    }

    fn resolve(_container: &Container, cx: &ResolveContext) -> Result<Self> {
        Ok(cx.token().clone())
    }
}

macro_rules! impl_dependency_for_tuple {
    ($($name:ident),+) => {
        impl<$($name),+> Dependency for ($($name,)+)
        where
            $($name: Dependency,)+
        {
            fn requirements(out: &mut Vec<Requirement>) {
                $($name::requirements(out);)+
            }

            #[allow(non_snake_case)]
            fn resolve(container: &Container, cx: &ResolveContext) -> Result<Self> {
                $(let $name = $name::resolve(container, cx)?;)+
                Ok(($($name,)+))
            }
        }
    };
}

impl_dependency_for_tuple!(A);
impl_dependency_for_tuple!(A, B);
impl_dependency_for_tuple!(A, B, C);
impl_dependency_for_tuple!(A, B, C, D);
impl_dependency_for_tuple!(A, B, C, D, E);
impl_dependency_for_tuple!(A, B, C, D, E, F);
