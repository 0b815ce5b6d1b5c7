//! Binding keys
//!
//! A [`TypeKey`] identifies a bound type by its `TypeId` together with the
//! kind of binding: a single owner, or one contribution to a collected
//! sequence. A [`ProviderKey`] adds the registration index, which is always
//! zero for single bindings and counts up per contribution otherwise.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// How a type is bound in a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Exactly one provider owns the type
    Single,
    /// Any number of providers contribute to a collected sequence
    Element,
    /// The collected sequence itself; appears on paths, never in bindings
    Collected,
}

/// Identity of a bound type
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    kind: BindingKind,
}

impl TypeKey {
    /// Key of a single-owner binding of `T`
    pub fn single<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: BindingKind::Single,
        }
    }

    /// Key of a multi-binding contribution of `T`
    pub fn element<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: BindingKind::Element,
        }
    }

    /// Underlying type id
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Binding kind
    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    /// Key naming the collected sequence of `T` contributions
    pub fn collected<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: BindingKind::Collected,
        }
    }

    /// Whether the key names a multi-binding contribution
    pub fn is_element(&self) -> bool {
        self.kind == BindingKind::Element
    }

    /// Key at the given registration index
    pub fn at(self, index: usize) -> ProviderKey {
        ProviderKey {
            type_key: self,
            index,
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.kind.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = short_type_name(self.name);
        match self.kind {
            BindingKind::Single => write!(f, "{name}"),
            BindingKind::Element => write!(f, "Element<{name}>"),
            BindingKind::Collected => write!(f, "Collected<{name}>"),
        }
    }
}

/// Key of one binding slot: a type plus its registration index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderKey {
    /// Bound type
    pub type_key: TypeKey,
    /// Registration index, zero for single bindings
    pub index: usize,
}

impl ProviderKey {
    /// Key of the single-owner binding of `T`
    pub fn single<T: ?Sized + 'static>() -> Self {
        TypeKey::single::<T>().at(0)
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.type_key.is_element() {
            write!(f, "{}[{}]", self.type_key, self.index)
        } else {
            write!(f, "{}", self.type_key)
        }
    }
}

/// Strip module paths from a type name
///
/// `alloc::sync::Arc<dyn app::db::Pool>` becomes `Arc<dyn Pool>`.
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut token_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(token_start);
            continue;
        }
        out.push(c);
        if matches!(
            c,
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' | '*'
        ) {
            token_start = out.len();
        }
    }
    out
}
