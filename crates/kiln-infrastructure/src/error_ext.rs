//! Error extension utilities
//!
//! Context extension methods turning foreign errors into the domain
//! [`Error`] while keeping the original error as the source.

use kiln_domain::{Error, Result};
use std::fmt;

/// Foreign error wrapped with a context message
#[derive(Debug, thiserror::Error)]
#[error("{message}: {source}")]
struct ContextError<E: std::error::Error + 'static> {
    message: String,
    #[source]
    source: E,
}

/// Extension trait for adding context to errors
///
/// # Example
///
/// ```ignore
/// use kiln_infrastructure::error_ext::ErrorContext;
///
/// let content = std::fs::read_to_string(&path)
///     .with_context(|| format!("Failed to read {}", path.display()))?;
///
/// let value: u64 = raw.parse().config_context("stop_timeout_ms must be a number")?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to a Result, converting the error to the domain Error type
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Add context with lazy evaluation for expensive context creation
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;

    /// Add context for configuration operations
    fn config_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|source| {
            Error::from_source(ContextError {
                message: context.to_string(),
                source,
            })
        })
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|source| {
            Error::from_source(ContextError {
                message: f().to_string(),
                source,
            })
        })
    }

    fn config_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|err| {
            Error::configuration_with_source(format!("{context}: {err}"), err)
        })
    }
}
