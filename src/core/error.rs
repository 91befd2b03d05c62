//! Error types for rule queries and deck draws.
//!
//! Every public boundary operation is total: failures are carried as data.
//! Internally the components return `Result<_, QueryError>` and convert at
//! the boundary into `RuleQueryResult` / `DrawResult`.

use thiserror::Error;

/// Failure reported by an external collaborator (dictionary, registry,
/// draw primitive, locator).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

impl CollaboratorError {
    /// Create a collaborator error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Error for a store whose lock was poisoned by a panicking writer.
    #[must_use]
    pub fn poisoned(store: &str) -> Self {
        Self(format!("{store} lock poisoned"))
    }
}

/// Broad failure classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller input out of range.
    Validation,
    /// Rule or deck absent.
    NotFound,
    /// The draw primitive could not resolve an expression.
    DrawFailure,
    /// A collaborator failed unexpectedly.
    Internal,
}

/// Errors produced by the rule resolver and draw orchestrator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("draw count must be between {min} and {max}")]
    InvalidCount { count: i32, min: i32, max: i32 },

    #[error("rule not found: {0}")]
    RuleNotFound(String),

    #[error("deck {0} does not exist")]
    DeckNotFound(String),

    #[error("draw from deck {0} failed")]
    DrawFailed(String),

    #[error("lookup exception: {0}")]
    Lookup(#[source] CollaboratorError),

    #[error("draw exception: {0}")]
    Engine(#[source] CollaboratorError),
}

impl QueryError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCount { .. } => ErrorKind::Validation,
            Self::RuleNotFound(_) | Self::DeckNotFound(_) => ErrorKind::NotFound,
            Self::DrawFailed(_) => ErrorKind::DrawFailure,
            Self::Lookup(_) | Self::Engine(_) => ErrorKind::Internal,
        }
    }
}
