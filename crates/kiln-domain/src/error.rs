//! Error handling types

use std::sync::Arc;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Shareable boxed error used as a source for wrapped failures
///
/// Errors are cloned when a service reports its last failure and when a
/// readiness probe hands its outcome to several waiters, so sources are
/// reference counted rather than boxed.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Main error type for Kiln
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// No binding for the requested type anywhere in the container chain
    #[error("type not provided: dependency path: {path}")]
    TypeNotProvided {
        /// Rendered dependency path that led to the missing type
        path: String,
    },

    /// A single-owner binding was registered twice
    #[error("type already provided: {type_name}")]
    TypeAlreadyProvided {
        /// Name of the duplicated type
        type_name: String,
    },

    /// The type is reserved and cannot be bound or requested
    #[error("type not allowed: {type_name}")]
    TypeNotAllowed {
        /// Name of the rejected type
        type_name: String,
    },

    /// Registration would introduce a dependency cycle
    #[error("circular dependency detected: {path}")]
    CircularDependency {
        /// Rendered cycle, starting and ending at the same key
        path: String,
    },

    /// Constructor shape is not acceptable
    #[error("invalid provider: {message}")]
    InvalidProvider {
        /// Description of the shape violation
        message: String,
    },

    /// The container already has a parent
    #[error("parent already set")]
    ParentAlreadySet,

    /// The lifecycle was already served (or its actor list is sealed)
    #[error("lifecycle already served")]
    AlreadyServed,

    /// A lifecycle without any long-running service was asked to serve
    #[error("no long-running services to serve")]
    NoServices,

    /// An actor failed to start
    #[error("failed to start actor {actor}: {source}")]
    ActorStart {
        /// Name of the actor
        actor: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// An actor failed to stop
    #[error("failed to stop actor {actor}: {source}")]
    ActorStop {
        /// Name of the actor
        actor: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// A constructor returned an error
    #[error("constructor {constructor} failed: {source}")]
    Constructor {
        /// Name of the constructor
        constructor: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// The operation was cancelled through its token
    #[error("operation cancelled")]
    Cancelled,

    /// The operation exceeded its deadline
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation
        operation: String,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<SharedError>,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },

    /// Generic error from external sources
    #[error("{0}")]
    Generic(SharedError),
}

// Basic error creation methods
impl Error {
    /// Create a generic error from a message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        let boxed: Box<dyn std::error::Error + Send + Sync> = message.into().into();
        Self::Generic(Arc::from(boxed))
    }

    /// Wrap any error as a generic error
    pub fn from_source<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Generic(Arc::new(source))
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid provider error
    pub fn invalid_provider<S: Into<String>>(message: S) -> Self {
        Self::InvalidProvider {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }
}

// Configuration error creation methods
impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Configuration {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }
}

// Actor and constructor wrapping
impl Error {
    /// Wrap a start failure with the actor identity
    pub fn actor_start<S: Into<String>>(actor: S, source: Error) -> Self {
        Self::ActorStart {
            actor: actor.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a stop failure with the actor identity
    pub fn actor_stop<S: Into<String>>(actor: S, source: Error) -> Self {
        Self::ActorStop {
            actor: actor.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a constructor failure with the constructor name
    pub fn constructor<S: Into<String>>(constructor: S, source: Error) -> Self {
        Self::Constructor {
            constructor: constructor.into(),
            source: Box::new(source),
        }
    }
}

// Classification
impl Error {
    /// Whether this error (or the failure it wraps) is a missing binding
    ///
    /// Constructor wrappers are looked through, so an optional dependency
    /// whose constructor failed on a missing type still counts as missing.
    pub fn is_not_provided(&self) -> bool {
        match self {
            Self::TypeNotProvided { .. } => true,
            Self::Constructor { source, .. } => source.is_not_provided(),
            _ => false,
        }
    }

    /// Whether this error is a registration-time cycle rejection
    pub fn is_circular_dependency(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }

    /// Whether this error reports cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        let boxed: Box<dyn std::error::Error + Send + Sync> = err.into();
        Self::Generic(Arc::from(boxed))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::from_source(err)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for Error {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Generic(Arc::from(err))
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self::generic(message)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Self::generic(message)
    }
}
