//! Value objects identifying bindings and resolution paths

pub mod keys;
pub mod path;

pub use keys::{short_type_name, BindingKind, ProviderKey, TypeKey};
pub use path::DependencyPath;
