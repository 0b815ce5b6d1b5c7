//! # Kiln Domain
//!
//! Core types shared by every Kiln layer.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Domain error enum and `Result` alias |
//! | [`value_objects`] | Binding keys and dependency paths |
//! | [`ports`] | Actor, Service and Readiness contracts |
//! | [`constants`] | Stage ordinals and shutdown budgets |
//! | [`locks`] | Poison-aware lock helpers |

pub mod constants;
pub mod error;
pub mod locks;
pub mod ports;
pub mod value_objects;

// Re-export commonly used types
pub use error::{Error, Result, SharedError};
pub use ports::{Actor, Readiness, Service};
pub use value_objects::{BindingKind, DependencyPath, ProviderKey, TypeKey};
