//! Constructors and modules
//!
//! Any `Fn` of up to eight [`Dependency`] arguments returning [`Outputs`] is
//! a [`Constructor`]. Registration erases it into a [`ProviderSpec`]: the
//! declared input requirements, the declared output bindings and a boxed
//! build function producing the type-erased values in declaration order.
//!
//! A [`Module`] groups constructors (and other modules) so they can be
//! registered as one batch. A batch that fails any check is rolled back
//! as a whole.

use crate::container::Container;
use crate::dependency::{Dependency, Requirement, ResolveContext};
use crate::output::{AnyValue, OutputContext, OutputSpec, Outputs};
use kiln_domain::Result;

pub(crate) type BuildFn =
    Box<dyn Fn(&Container, &ResolveContext) -> Result<Vec<AnyValue>> + Send + Sync>;

/// A registrable function; `Args` is the tuple of its parameter types
pub trait Constructor<Args>: Send + Sync + 'static {
    /// Return type of the function
    type Output: Outputs;

    /// Requirements of every parameter, in order
    fn requirements() -> Vec<Requirement>;

    /// Resolve the parameters and call the function
    fn construct(&self, container: &Container, cx: &ResolveContext) -> Result<Self::Output>;
}

/// A function called once by `Container::invoke`
pub trait Invocable<Args> {
    /// Return type of the function
    type Output: Outputs;

    /// Resolve the parameters and call the function
    fn invoke(self, container: &Container, cx: &ResolveContext) -> Result<Self::Output>;
}

macro_rules! impl_constructor {
    ($($arg:ident),*) => {
        impl<Func, Ret, $($arg,)*> Constructor<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Ret + Send + Sync + 'static,
            Ret: Outputs,
            $($arg: Dependency,)*
        {
            type Output = Ret;

            #[allow(unused_mut)]
            fn requirements() -> Vec<Requirement> {
                let mut out = Vec::new();
                $($arg::requirements(&mut out);)*
                out
            }

            #[allow(non_snake_case, unused_variables)]
            fn construct(&self, container: &Container, cx: &ResolveContext) -> Result<Ret> {
                $(let $arg = $arg::resolve(container, cx)?;)*
                Ok(self($($arg),*))
            }
        }

        impl<Func, Ret, $($arg,)*> Invocable<($($arg,)*)> for Func
        where
            Func: FnOnce($($arg),*) -> Ret,
            Ret: Outputs,
            $($arg: Dependency,)*
        {
            type Output = Ret;

            #[allow(non_snake_case, unused_variables)]
            fn invoke(self, container: &Container, cx: &ResolveContext) -> Result<Ret> {
                $(let $arg = $arg::resolve(container, cx)?;)*
                Ok(self($($arg),*))
            }
        }
    };
}

impl_constructor!();
impl_constructor!(A1);
impl_constructor!(A1, A2);
impl_constructor!(A1, A2, A3);
impl_constructor!(A1, A2, A3, A4);
impl_constructor!(A1, A2, A3, A4, A5);
impl_constructor!(A1, A2, A3, A4, A5, A6);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Type-erased constructor ready for registration
pub struct ProviderSpec {
    pub(crate) label: &'static str,
    pub(crate) inputs: Vec<Requirement>,
    pub(crate) outputs: Vec<OutputSpec>,
    pub(crate) build: BuildFn,
}

impl ProviderSpec {
    /// Erase a constructor
    pub fn new<C, Args>(constructor: C) -> Self
    where
        C: Constructor<Args>,
        Args: 'static,
    {
        let label = std::any::type_name::<C>();
        let mut outputs = Vec::new();
        <C::Output as Outputs>::specs(&mut outputs);
        let build: BuildFn = Box::new(move |container, cx| {
            let raw = constructor.construct(container, cx)?;
            let ctx = OutputContext {
                container,
                cx,
                constructor: label,
            };
            let finished = raw.finish(&ctx)?;
            let mut values = Vec::new();
            <C::Output as Outputs>::erase(finished, &mut values);
            Ok(values)
        });
        Self {
            label,
            inputs: C::requirements(),
            outputs,
            build,
        }
    }

    /// Name of the underlying function
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl std::fmt::Debug for ProviderSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSpec")
            .field("label", &self.label)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// Ordered group of constructors registered as one batch
#[derive(Debug, Default)]
pub struct Module {
    specs: Vec<ProviderSpec>,
}

impl Module {
    /// Empty module
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constructor
    #[must_use]
    pub fn provide<C, Args>(mut self, constructor: C) -> Self
    where
        C: Constructor<Args>,
        Args: 'static,
    {
        self.specs.push(ProviderSpec::new(constructor));
        self
    }

    /// Append every constructor of another module
    #[must_use]
    pub fn include(mut self, other: Module) -> Self {
        self.specs.extend(other.specs);
        self
    }

    /// Number of constructors
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the module has no constructors
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub(crate) fn into_specs(self) -> Vec<ProviderSpec> {
        self.specs
    }
}
