//! Dependency paths
//!
//! Resolution threads a [`DependencyPath`] through every nested lookup so a
//! missing type can be reported together with the chain that asked for it.

use super::keys::ProviderKey;
use crate::constants::PATH_SEPARATOR;
use std::fmt;

/// Ordered chain of keys traversed by one resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyPath {
    keys: Vec<ProviderKey>,
}

impl DependencyPath {
    /// Empty path
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this path extended by `key`
    pub fn with(&self, key: ProviderKey) -> Self {
        let mut keys = Vec::with_capacity(self.keys.len() + 1);
        keys.extend_from_slice(&self.keys);
        keys.push(key);
        Self { keys }
    }

    /// Index of the first key satisfying `pred`
    pub fn position(&self, pred: impl Fn(&ProviderKey) -> bool) -> Option<usize> {
        self.keys.iter().position(pred)
    }

    /// Path from `start` onwards
    pub fn suffix(&self, start: usize) -> Self {
        Self {
            keys: self.keys.get(start..).unwrap_or_default().to_vec(),
        }
    }

    /// Number of keys on the path
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the path is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Display for DependencyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(PATH_SEPARATOR)?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}
