//! Domain error taxonomy shared by value objects and the customer aggregate.
//!
//! # Invariants
//! - Every variant carries the stable, human-readable message shown to callers.
//! - Domain errors are deterministic; none of them is worth retrying.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DomainResult<T> = Result<T, DomainError>;

/// Classification of a [`DomainError`], independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainErrorKind {
    Validation,
    Duplicate,
    NotFound,
    Invariant,
}

/// Failure raised by a value object factory or an aggregate operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value or name fails its format/length rule.
    Validation(String),
    /// An add operation targets a value already present in the aggregate.
    Duplicate(String),
    /// A remove/set-primary operation targets a value that does not exist.
    NotFound(String),
    /// The operation would break a structural rule of the aggregate.
    Invariant(String),
}

impl DomainError {
    pub fn kind(&self) -> DomainErrorKind {
        match self {
            Self::Validation(_) => DomainErrorKind::Validation,
            Self::Duplicate(_) => DomainErrorKind::Duplicate,
            Self::NotFound(_) => DomainErrorKind::NotFound,
            Self::Invariant(_) => DomainErrorKind::Invariant,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(message)
            | Self::Duplicate(message)
            | Self::NotFound(message)
            | Self::Invariant(message) => message,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Error for DomainError {}
