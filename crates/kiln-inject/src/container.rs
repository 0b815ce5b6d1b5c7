//! Dependency container
//!
//! Stores pending providers and memoised values keyed by [`ProviderKey`].
//!
//! ## Resolution
//!
//! ```text
//! resolve(key)
//!   ├─ memoised value?          → return it            (shared lock)
//!   ├─ pending provider?        → run once per provider (once-cell),
//!   │                             memoise every output, retire provider
//!   ├─ parent container?        → delegate, same request
//!   └─ otherwise                → TypeNotProvided { path }
//! ```
//!
//! Constructors run outside the state lock; concurrent requests for keys
//! of the same provider wait on that provider's cell instead of running it
//! again. A key is constructed at most once per container.
//!
//! ## Registration
//!
//! `provide` checks every constructor of the batch, registers it
//! tentatively, then runs cycle detection from every new key. Any failure
//! restores the state captured before the batch.

use crate::constructor::{BuildFn, Constructor, Invocable, Module, ProviderSpec};
use crate::cycle::{self, Edge, Graph};
use crate::dependency::{Dependency, Requirement, ResolveContext};
use crate::element::is_void;
use crate::inject::{FieldDependency, FieldInjector, Injectable};
use crate::output::{AnyValue, OutputContext, Outputs, downcast_arc};
use kiln_domain::locks::{lock_rwlock_read, lock_rwlock_write};
use kiln_domain::{Error, ProviderKey, Result, TypeKey};
use once_cell::sync::OnceCell;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Registered constructor waiting for its first resolution
struct Provider {
    seq: u64,
    label: &'static str,
    inputs: Vec<Requirement>,
    /// Output keys in declaration order
    keys: Vec<ProviderKey>,
    /// Field requirements per output, parallel to `keys`
    fields: Vec<Vec<FieldDependency>>,
    build: BuildFn,
    cell: OnceCell<()>,
}

#[derive(Clone, Default)]
struct State {
    values: HashMap<ProviderKey, AnyValue>,
    providers: HashMap<ProviderKey, Arc<Provider>>,
    element_counts: HashMap<TypeKey, usize>,
    next_seq: u64,
    parent: Option<Arc<Container>>,
}

/// Type-keyed dependency container
///
/// # Example
///
/// ```ignore
/// let container = Container::new();
/// container.provide(|| Arc::new(Config::default()))?;
/// container.provide(|config: Arc<Config>| Arc::new(Pool::connect(&config)))?;
///
/// let pool: Arc<Pool> = container.resolve()?;
/// ```
#[derive(Default)]
pub struct Container {
    state: RwLock<State>,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.state.read() {
            Ok(state) => f
                .debug_struct("Container")
                .field("values", &state.values.len())
                .field("providers", &state.providers.len())
                .field("has_parent", &state.parent.is_some())
                .finish(),
            Err(_) => f.debug_struct("Container").finish_non_exhaustive(),
        }
    }
}

// ============================================================================
// Construction and parents
// ============================================================================

impl Container {
    /// Empty container without a parent
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty container falling back to `parent` for missing keys
    pub fn child(parent: Arc<Container>) -> Self {
        Self {
            state: RwLock::new(State {
                parent: Some(parent),
                ..State::default()
            }),
        }
    }

    /// Set the fallback parent; only allowed once
    pub fn set_parent(&self, parent: Arc<Container>) -> Result<()> {
        let mut state = lock_rwlock_write(&self.state, "container state")?;
        if state.parent.is_some() {
            return Err(Error::ParentAlreadySet);
        }
        state.parent = Some(parent);
        Ok(())
    }

    fn parent(&self) -> Result<Option<Arc<Container>>> {
        let state = lock_rwlock_read(&self.state, "container state")?;
        Ok(state.parent.clone())
    }
}

// ============================================================================
// Registration
// ============================================================================

impl Container {
    /// Register one constructor
    pub fn provide<C, Args>(&self, constructor: C) -> Result<()>
    where
        C: Constructor<Args>,
        Args: 'static,
    {
        self.provide_module(Module::new().provide(constructor))
    }

    /// Register every constructor of `module` as one batch
    pub fn provide_module(&self, module: Module) -> Result<()> {
        let specs = module.into_specs();
        if specs.is_empty() {
            return Ok(());
        }
        let count = specs.len();

        let mut state = lock_rwlock_write(&self.state, "container state")?;
        let checkpoint = state.clone();
        match Self::register_batch(&mut state, specs) {
            Ok(()) => {
                debug!(constructors = count, "registered constructors");
                Ok(())
            }
            Err(err) => {
                *state = checkpoint;
                debug!(error = %err, "constructor batch rejected");
                Err(err)
            }
        }
    }

    fn register_batch(state: &mut State, specs: Vec<ProviderSpec>) -> Result<()> {
        let mut added = Vec::new();
        for spec in specs {
            added.extend(Self::register(state, spec)?);
        }
        for key in added {
            cycle::detect_cycle(&*state, key)?;
        }
        Ok(())
    }

    fn register(state: &mut State, spec: ProviderSpec) -> Result<Vec<ProviderKey>> {
        for input in &spec.inputs {
            if let Requirement::Single(key) | Requirement::Optional(key) = input {
                reject_void(key)?;
            }
        }
        for field in spec.outputs.iter().flat_map(|o| o.fields.iter()) {
            reject_void(&field.key)?;
        }

        let mut keys = Vec::with_capacity(spec.outputs.len());
        let mut seen = HashSet::new();
        for output in &spec.outputs {
            let type_key = output.key;
            let key = if type_key.is_element() {
                let count = state.element_counts.entry(type_key).or_insert(0);
                let key = type_key.at(*count);
                *count += 1;
                key
            } else {
                reject_void(&type_key)?;
                if !seen.insert(type_key) {
                    return Err(Error::invalid_provider(format!(
                        "{} returns {type_key} more than once",
                        spec.label
                    )));
                }
                let key = type_key.at(0);
                if state.values.contains_key(&key) || state.providers.contains_key(&key) {
                    return Err(Error::TypeAlreadyProvided {
                        type_name: type_key.to_string(),
                    });
                }
                key
            };
            keys.push(key);
        }

        let provider = Arc::new(Provider {
            seq: state.next_seq,
            label: spec.label,
            inputs: spec.inputs,
            keys: keys.clone(),
            fields: spec.outputs.into_iter().map(|o| o.fields).collect(),
            build: spec.build,
            cell: OnceCell::new(),
        });
        state.next_seq += 1;
        for key in &keys {
            state.providers.insert(*key, Arc::clone(&provider));
        }
        trace!(constructor = provider.label, seq = provider.seq, "provider registered");
        Ok(keys)
    }
}

fn reject_void(key: &TypeKey) -> Result<()> {
    if is_void(key) {
        return Err(Error::TypeNotAllowed {
            type_name: key.to_string(),
        });
    }
    Ok(())
}

impl Graph for State {
    fn edges(&self, key: ProviderKey) -> Vec<Edge> {
        let Some(provider) = self.providers.get(&key) else {
            return Vec::new();
        };
        let mut edges = Vec::new();

        // Field requirements of the node itself, then of its siblings
        let own = provider.keys.iter().position(|k| *k == key);
        let ordered = own
            .into_iter()
            .chain((0..provider.keys.len()).filter(|i| Some(*i) != own));
        for i in ordered {
            let dependent = provider.keys[i].type_key;
            for field in &provider.fields[i] {
                edges.push(Edge {
                    to: field.key.at(0),
                    via: Some(dependent),
                });
            }
        }

        for input in &provider.inputs {
            match input {
                Requirement::Context => {}
                Requirement::Single(type_key) | Requirement::Optional(type_key) => {
                    edges.push(Edge {
                        to: type_key.at(0),
                        via: None,
                    });
                }
                Requirement::Collected(type_key) => {
                    let count = self.element_counts.get(type_key).copied().unwrap_or(0);
                    edges.extend((0..count).map(|i| Edge {
                        to: type_key.at(i),
                        via: None,
                    }));
                }
            }
        }
        edges
    }
}

// ============================================================================
// Resolution
// ============================================================================

impl Container {
    /// Resolve a dependency (`Arc<T>`, `Option<Arc<T>>`, `Collected<T>`, tuples)
    pub fn resolve<D: Dependency>(&self) -> Result<D> {
        self.resolve_with(CancellationToken::new())
    }

    /// Resolve a dependency, handing `token` to context parameters
    pub fn resolve_with<D: Dependency>(&self, token: CancellationToken) -> Result<D> {
        D::resolve(self, &ResolveContext::new(token))
    }

    /// Every contribution to `T`, parent entries first
    pub fn resolve_collected<T>(&self) -> Result<Vec<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_elements_in::<T>(&ResolveContext::default())
    }

    pub(crate) fn resolve_single_in<T>(&self, cx: &ResolveContext) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_key = TypeKey::single::<T>();
        reject_void(&type_key)?;
        let value = self.resolve_key(type_key.at(0), cx)?;
        downcast_arc::<T>(&value)
            .ok_or_else(|| Error::internal(format!("stored value for {type_key} has another type")))
    }

    pub(crate) fn resolve_elements_in<T>(&self, cx: &ResolveContext) -> Result<Vec<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_key = TypeKey::element::<T>();
        let mut items = Vec::new();
        if let Some(parent) = self.parent()? {
            if parent.has_elements(type_key)? {
                items.extend(parent.resolve_elements_in::<T>(cx)?);
            }
        }

        let cx = cx.enter(TypeKey::collected::<T>().at(0));

        let count = self.local_element_count(type_key)?;
        if items.is_empty() && count == 0 {
            return Err(Error::TypeNotProvided {
                path: cx.path().to_string(),
            });
        }
        for index in 0..count {
            let key = type_key.at(index);
            let value = self.resolve_key(key, &cx)?;
            let item = downcast_arc::<T>(&value)
                .ok_or_else(|| Error::internal(format!("stored value for {key} has another type")))?;
            items.push(item);
        }
        Ok(items)
    }

    fn local_element_count(&self, type_key: TypeKey) -> Result<usize> {
        let state = lock_rwlock_read(&self.state, "container state")?;
        Ok(state.element_counts.get(&type_key).copied().unwrap_or(0))
    }

    fn has_elements(&self, type_key: TypeKey) -> Result<bool> {
        if self.local_element_count(type_key)? > 0 {
            return Ok(true);
        }
        match self.parent()? {
            Some(parent) => parent.has_elements(type_key),
            None => Ok(false),
        }
    }

    fn resolve_key(&self, key: ProviderKey, cx: &ResolveContext) -> Result<AnyValue> {
        let (provider, parent) = {
            let state = lock_rwlock_read(&self.state, "container state")?;
            if let Some(value) = state.values.get(&key) {
                trace!(key = %key, "memoised value");
                return Ok(Arc::clone(value));
            }
            (state.providers.get(&key).cloned(), state.parent.clone())
        };

        let entered = cx.enter(key);
        if let Some(provider) = provider {
            // Re-entering a provider that is still running on this path
            // would block on its own cell
            if let Some(start) = cx.path().position(|k| provider.keys.contains(k)) {
                return Err(Error::CircularDependency {
                    path: entered.path().suffix(start).to_string(),
                });
            }
            provider
                .cell
                .get_or_try_init(|| self.run_provider(&provider, &entered))?;
            let state = lock_rwlock_read(&self.state, "container state")?;
            return state
                .values
                .get(&key)
                .cloned()
                .ok_or_else(|| Error::internal(format!("provider for {key} left no value")));
        }

        if let Some(parent) = parent {
            return parent.resolve_key(key, cx);
        }

        Err(Error::TypeNotProvided {
            path: entered.path().to_string(),
        })
    }

    fn run_provider(&self, provider: &Provider, cx: &ResolveContext) -> Result<()> {
        if cx.token().is_cancelled() {
            return Err(Error::Cancelled);
        }
        debug!(constructor = provider.label, seq = provider.seq, "running constructor");
        let values = (provider.build)(self, cx)?;
        if values.len() != provider.keys.len() {
            return Err(Error::internal(format!(
                "{} produced {} values for {} outputs",
                provider.label,
                values.len(),
                provider.keys.len()
            )));
        }

        let mut state = lock_rwlock_write(&self.state, "container state")?;
        for (key, value) in provider.keys.iter().zip(values) {
            state.providers.remove(key);
            state.values.insert(*key, value);
        }
        Ok(())
    }
}

// ============================================================================
// Invoke, apply and build
// ============================================================================

impl Container {
    /// Call `f` once with resolved arguments
    pub fn invoke<F, Args>(&self, f: F) -> Result<<F::Output as Outputs>::Value>
    where
        F: Invocable<Args>,
    {
        self.invoke_with(CancellationToken::new(), f)
    }

    /// Call `f` once, handing `token` to context parameters
    pub fn invoke_with<F, Args>(
        &self,
        token: CancellationToken,
        f: F,
    ) -> Result<<F::Output as Outputs>::Value>
    where
        F: Invocable<Args>,
    {
        let cx = ResolveContext::new(token);
        let raw = f.invoke(self, &cx)?;
        raw.finish(&OutputContext {
            container: self,
            cx: &cx,
            constructor: std::any::type_name::<F>(),
        })
    }

    /// Inject the fields of an existing value
    pub fn apply<T: Injectable>(&self, target: &mut T) -> Result<()> {
        self.apply_with(CancellationToken::new(), target)
    }

    /// Inject the fields of an existing value, handing `token` to the hook
    pub fn apply_with<T: Injectable>(&self, token: CancellationToken, target: &mut T) -> Result<()> {
        let cx = ResolveContext::new(token);
        target.inject(&mut FieldInjector::new(self, &cx))
    }

    /// Resolve every pending provider in registration order
    pub fn build(&self) -> Result<()> {
        self.build_with(CancellationToken::new())
    }

    /// Resolve every pending provider, cancelling on `token`
    pub fn build_with(&self, token: CancellationToken) -> Result<()> {
        let mut pending: Vec<(u64, ProviderKey)> = {
            let state = lock_rwlock_read(&self.state, "container state")?;
            state
                .providers
                .iter()
                .map(|(key, provider)| (provider.seq, *key))
                .collect()
        };
        pending.sort_by_key(|(seq, key)| (*seq, key.index));
        debug!(pending = pending.len(), "building container");

        let cx = ResolveContext::new(token);
        for (_, key) in pending {
            self.resolve_key(key, &cx)?;
        }
        Ok(())
    }

    /// Register `module`, then build
    pub fn build_module(&self, module: Module) -> Result<()> {
        self.build_module_with(CancellationToken::new(), module)
    }

    /// Register `module`, then build, cancelling on `token`
    pub fn build_module_with(&self, token: CancellationToken, module: Module) -> Result<()> {
        self.provide_module(module)?;
        self.build_with(token)
    }

    /// Whether a single binding of `T` exists here or in a parent
    pub fn is_provided<T: ?Sized + 'static>(&self) -> Result<bool> {
        let key = ProviderKey::single::<T>();
        let parent = {
            let state = lock_rwlock_read(&self.state, "container state")?;
            if state.values.contains_key(&key) || state.providers.contains_key(&key) {
                return Ok(true);
            }
            state.parent.clone()
        };
        match parent {
            Some(parent) => parent.is_provided::<T>(),
            None => Ok(false),
        }
    }
}
