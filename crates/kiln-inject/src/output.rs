//! Constructor outputs
//!
//! The return type of a constructor decides which bindings it owns:
//!
//! | Return type | Binding |
//! |-------------|---------|
//! | `Arc<T>` | single `T` |
//! | `Injected<T>` | single `T`, fields injected before wrapping |
//! | `Element<T>` | next contribution to `Collected<T>` |
//! | `(O1, O2, ...)` | one binding per member |
//! | `()` | contribution to `Collected<Void>` |
//! | `Result<R, E>` | the bindings of `R`; `E` surfaces as a constructor error |
//!
//! Values are type-erased as `Arc<Arc<T>>` behind [`AnyValue`] so unsized
//! targets such as `Arc<dyn Trait>` share one representation with sized ones.

use crate::container::Container;
use crate::dependency::ResolveContext;
use crate::element::{Element, Void};
use crate::inject::{FieldDependency, FieldInjector, FieldSet, Injectable};
use kiln_domain::{Error, Result, TypeKey};
use std::any::Any;
use std::sync::Arc;

/// Type-erased memoised value
pub type AnyValue = Arc<dyn Any + Send + Sync>;

pub(crate) fn erase_arc<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> AnyValue {
    Arc::new(value)
}

pub(crate) fn downcast_arc<T: ?Sized + Send + Sync + 'static>(value: &AnyValue) -> Option<Arc<T>> {
    value.downcast_ref::<Arc<T>>().map(Arc::clone)
}

/// Binding declared by one output slot
#[derive(Debug, Clone)]
pub struct OutputSpec {
    /// Bound key (single or element)
    pub key: TypeKey,
    /// Fields injected into the value after construction
    pub fields: Vec<FieldDependency>,
}

impl OutputSpec {
    fn plain(key: TypeKey) -> Self {
        Self {
            key,
            fields: Vec::new(),
        }
    }
}

/// What finishing an output needs from the running resolution
pub struct OutputContext<'a> {
    pub(crate) container: &'a Container,
    pub(crate) cx: &'a ResolveContext,
    pub(crate) constructor: &'static str,
}

/// Wrapper asking the container to inject fields into `T` before binding it
///
/// ```ignore
/// container.provide(|| Injected::new(Handler::default()))?;
/// let handler: Arc<Handler> = container.resolve()?;
/// ```
pub struct Injected<T>(T);

impl<T: Injectable> Injected<T> {
    /// Wrap a freshly constructed value
    pub fn new(value: T) -> Self {
        Self(value)
    }
}

/// One output slot of a constructor
pub trait Output: Send + 'static {
    /// Value handed back to `invoke` callers
    type Value: Send + 'static;

    /// Binding this slot declares
    fn spec() -> OutputSpec;

    /// Complete the value (field injection happens here)
    fn finish(self, ctx: &OutputContext<'_>) -> Result<Self::Value>;

    /// Erase the finished value for storage
    fn erase(value: Self::Value) -> AnyValue;
}

impl<T: ?Sized + Send + Sync + 'static> Output for Arc<T> {
    type Value = Arc<T>;

    fn spec() -> OutputSpec {
        OutputSpec::plain(TypeKey::single::<T>())
    }

    fn finish(self, _ctx: &OutputContext<'_>) -> Result<Self::Value> {
        Ok(self)
    }

    fn erase(value: Self::Value) -> AnyValue {
        erase_arc(value)
    }
}

impl<T: Injectable> Output for Injected<T> {
    type Value = Arc<T>;

    fn spec() -> OutputSpec {
        let mut fields = FieldSet::new();
        T::declare_fields(&mut fields);
        OutputSpec {
            key: TypeKey::single::<T>(),
            fields: fields.into_vec(),
        }
    }

    fn finish(self, ctx: &OutputContext<'_>) -> Result<Self::Value> {
        let mut value = self.0;
        value.inject(&mut FieldInjector::new(ctx.container, ctx.cx))?;
        Ok(Arc::new(value))
    }

    fn erase(value: Self::Value) -> AnyValue {
        erase_arc(value)
    }
}

impl<T: ?Sized + Send + Sync + 'static> Output for Element<T> {
    type Value = Arc<T>;

    fn spec() -> OutputSpec {
        OutputSpec::plain(TypeKey::element::<T>())
    }

    fn finish(self, _ctx: &OutputContext<'_>) -> Result<Self::Value> {
        Ok(self.into_inner())
    }

    fn erase(value: Self::Value) -> AnyValue {
        erase_arc(value)
    }
}

/// Full return type of a constructor
pub trait Outputs: Send + 'static {
    /// Value handed back to `invoke` callers
    type Value: Send + 'static;

    /// Append the bindings, in declaration order
    fn specs(out: &mut Vec<OutputSpec>);

    /// Complete the values
    fn finish(self, ctx: &OutputContext<'_>) -> Result<Self::Value>;

    /// Erase the finished values, in the order of [`Outputs::specs`]
    fn erase(value: Self::Value, out: &mut Vec<AnyValue>);
}

impl<T: Injectable> Outputs for Injected<T> {
    type Value = Arc<T>;

    fn specs(out: &mut Vec<OutputSpec>) {
        out.push(<Self as Output>::spec());
    }

    fn finish(self, ctx: &OutputContext<'_>) -> Result<Self::Value> {
        Output::finish(self, ctx)
    }

    fn erase(value: Self::Value, out: &mut Vec<AnyValue>) {
        out.push(<Self as Output>::erase(value));
    }
}

impl<T: ?Sized + Send + Sync + 'static> Outputs for Element<T> {
    type Value = Arc<T>;

    fn specs(out: &mut Vec<OutputSpec>) {
        out.push(<Self as Output>::spec());
    }

    fn finish(self, ctx: &OutputContext<'_>) -> Result<Self::Value> {
        Output::finish(self, ctx)
    }

    fn erase(value: Self::Value, out: &mut Vec<AnyValue>) {
        out.push(<Self as Output>::erase(value));
    }
}

impl<T: ?Sized + Send + Sync + 'static> Outputs for Arc<T> {
    type Value = Arc<T>;

    fn specs(out: &mut Vec<OutputSpec>) {
        out.push(<Self as Output>::spec());
    }

    fn finish(self, ctx: &OutputContext<'_>) -> Result<Self::Value> {
        Output::finish(self, ctx)
    }

    fn erase(value: Self::Value, out: &mut Vec<AnyValue>) {
        out.push(<Self as Output>::erase(value));
    }
}

impl Outputs for () {
    type Value = ();

    fn specs(out: &mut Vec<OutputSpec>) {
        out.push(OutputSpec::plain(TypeKey::element::<Void>()));
    }

    fn finish(self, _ctx: &OutputContext<'_>) -> Result<Self::Value> {
        Ok(())
    }

    fn erase((): Self::Value, out: &mut Vec<AnyValue>) {
        out.push(erase_arc(Arc::new(Void)));
    }
}

impl<R, E> Outputs for std::result::Result<R, E>
where
    R: Outputs,
    E: Into<Error> + Send + 'static,
{
    type Value = R::Value;

    fn specs(out: &mut Vec<OutputSpec>) {
        R::specs(out);
    }

    fn finish(self, ctx: &OutputContext<'_>) -> Result<Self::Value> {
        match self {
            Ok(value) => value.finish(ctx),
            Err(err) => Err(Error::constructor(ctx.constructor, err.into())),
        }
    }

    fn erase(value: Self::Value, out: &mut Vec<AnyValue>) {
        R::erase(value, out);
    }
}

macro_rules! impl_outputs_for_tuple {
    ($($name:ident),+) => {
        impl<$($name),+> Outputs for ($($name,)+)
        where
            $($name: Output,)+
        {
            type Value = ($($name::Value,)+);

            fn specs(out: &mut Vec<OutputSpec>) {
                $(out.push($name::spec());)+
            }

            #[allow(non_snake_case)]
            fn finish(self, ctx: &OutputContext<'_>) -> Result<Self::Value> {
                let ($($name,)+) = self;
                Ok(($($name.finish(ctx)?,)+))
            }

            #[allow(non_snake_case)]
            fn erase(value: Self::Value, out: &mut Vec<AnyValue>) {
                let ($($name,)+) = value;
                $(out.push(<$name as Output>::erase($name));)+
            }
        }
    };
}

impl_outputs_for_tuple!(A, B);
impl_outputs_for_tuple!(A, B, C);
impl_outputs_for_tuple!(A, B, C, D);
