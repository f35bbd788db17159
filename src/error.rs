//! Unified error handling for the myeongbu crate
//!
//! Every coordinator operation fails with [`Error`]. The variants map
//! one-to-one onto the failure modes the HTTP layer reports:
//!
//! - [`Error::MalformedInput`] - unreadable request body or parameter
//! - [`Error::InvalidIdentifier`] - identifier does not parse
//! - [`Error::NotFound`] - lookup or primary update matched nothing
//! - [`Error::Persistence`] - a store call failed before anything was
//!   committed
//! - [`Error::Partial`] - a later step of a multi-record write failed
//!   after earlier steps committed, leaving the collections inconsistent
//!
//! Failures are terminal: nothing is retried and committed steps are
//! never rolled back. `Partial` exists so that an inconsistent outcome
//! is reported as such rather than as an opaque store failure.

use std::fmt;
use thiserror::Error;

use crate::models::InvalidStudentId;
use crate::store::StoreError;

/// Result type alias using the unified [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// One step of a multi-record write, in coordinator order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStep {
    /// The primary students collection
    Student,
    /// The grade_levels dependent collection
    GradeLevel,
    /// The classes dependent collection
    Class,
}

impl RecordStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::GradeLevel => "grade level",
            Self::Class => "class",
        }
    }
}

impl fmt::Display for RecordStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn join_steps(steps: &[RecordStep]) -> String {
    steps
        .iter()
        .map(RecordStep::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Unified error type for record operations
#[derive(Debug, Error)]
pub enum Error {
    /// Request body or parameter could not be read
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Identifier does not parse into the store's key format
    #[error("'{given}' is not a valid student identifier")]
    InvalidIdentifier { given: String },

    /// Lookup or primary update matched nothing
    #[error("{what} not found")]
    NotFound { what: &'static str },

    /// Store failure with no prior committed step
    #[error("{operation} failed: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// A step failed after earlier steps committed; the collections are
    /// now inconsistent and no rollback is attempted
    #[error("{operation} partially applied: {failed} write failed after {} committed: {source}", join_steps(.committed))]
    Partial {
        operation: &'static str,
        failed: RecordStep,
        committed: Vec<RecordStep>,
        #[source]
        source: StoreError,
    },
}

impl Error {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound { what }
    }

    pub fn persistence(operation: &'static str, source: StoreError) -> Self {
        Self::Persistence { operation, source }
    }

    pub fn partial(
        operation: &'static str,
        failed: RecordStep,
        committed: Vec<RecordStep>,
        source: StoreError,
    ) -> Self {
        Self::Partial {
            operation,
            failed,
            committed,
            source,
        }
    }

    /// Machine-readable error kind, reported in HTTP error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "malformed_input",
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::NotFound { .. } => "not_found",
            Self::Persistence { .. } => "persistence_failure",
            Self::Partial { .. } => "partial_failure",
        }
    }
}

impl From<InvalidStudentId> for Error {
    fn from(err: InvalidStudentId) -> Self {
        Self::InvalidIdentifier { given: err.given }
    }
}
