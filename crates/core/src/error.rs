//! Error types for Quire
//!
//! Every fallible operation in the workspace returns [`QuireResult`].
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Error Kinds
//!
//! | Variant | Status | Raised when |
//! |---------|--------|-------------|
//! | `NotFound` | 404 | no document at (partition, id) |
//! | `Conflict` | 409 | create collides with an existing (partition, id) |
//! | `PreconditionFailed` | 412 | supplied version token is stale |
//! | `InvalidPatch` | 400 | a patch operation cannot be applied |
//! | `InvalidQuery` | 400 | query text is malformed or a parameter is unbound |
//! | `InvalidInput` | 400 | document shape, id or partition key is invalid |
//! | `Config` | 400 | container configuration is invalid or unreadable |
//!
//! Nothing is retried internally. Retrying a `PreconditionFailed` write
//! (re-read, re-apply, re-submit) is the caller's decision.

use crate::partition::PartitionKey;
use thiserror::Error;

/// Result type alias for Quire operations
pub type QuireResult<T> = std::result::Result<T, QuireError>;

/// Error types for the document store
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QuireError {
    /// No document exists at the addressed slot
    #[error("document '{id}' not found in partition {partition}")]
    NotFound {
        /// Document id
        id: String,
        /// Partition-key value
        partition: PartitionKey,
    },

    /// A document already occupies the addressed slot
    #[error("document '{id}' already exists in partition {partition}")]
    Conflict {
        /// Document id
        id: String,
        /// Partition-key value
        partition: PartitionKey,
    },

    /// The caller's version token does not match the stored one
    #[error("precondition failed for document '{id}' in partition {partition}: version token is stale")]
    PreconditionFailed {
        /// Document id
        id: String,
        /// Partition-key value
        partition: PartitionKey,
    },

    /// A patch operation in a batch could not be applied
    #[error("invalid patch operation #{index} ({operation}): {reason}")]
    InvalidPatch {
        /// Zero-based position of the failing operation in the batch
        index: usize,
        /// Rendering of the failing operation
        operation: String,
        /// Why it failed
        reason: String,
    },

    /// The query text or its parameter bindings are invalid
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The submitted document is malformed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The container configuration is invalid
    #[error("configuration error: {0}")]
    Config(String),
}

impl QuireError {
    /// Create a NotFound error
    pub fn not_found(id: impl Into<String>, partition: &PartitionKey) -> Self {
        QuireError::NotFound {
            id: id.into(),
            partition: partition.clone(),
        }
    }

    /// Create a Conflict error
    pub fn conflict(id: impl Into<String>, partition: &PartitionKey) -> Self {
        QuireError::Conflict {
            id: id.into(),
            partition: partition.clone(),
        }
    }

    /// Create a PreconditionFailed error
    pub fn precondition_failed(id: impl Into<String>, partition: &PartitionKey) -> Self {
        QuireError::PreconditionFailed {
            id: id.into(),
            partition: partition.clone(),
        }
    }

    /// Create an InvalidPatch error
    pub fn invalid_patch(
        index: usize,
        operation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        QuireError::InvalidPatch {
            index,
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidQuery error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        QuireError::InvalidQuery(message.into())
    }

    /// Create an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        QuireError::InvalidInput(message.into())
    }

    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        QuireError::Config(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, QuireError::NotFound { .. })
    }

    /// Check if this is a Conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, QuireError::Conflict { .. })
    }

    /// Check if this is a PreconditionFailed error
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, QuireError::PreconditionFailed { .. })
    }

    /// Check if this is an InvalidPatch error
    pub fn is_invalid_patch(&self) -> bool {
        matches!(self, QuireError::InvalidPatch { .. })
    }

    /// Check if this is an InvalidQuery error
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, QuireError::InvalidQuery(_))
    }

    /// HTTP-style status code for this error kind
    pub fn status_code(&self) -> u16 {
        match self {
            QuireError::NotFound { .. } => 404,
            QuireError::Conflict { .. } => 409,
            QuireError::PreconditionFailed { .. } => 412,
            QuireError::InvalidPatch { .. }
            | QuireError::InvalidQuery(_)
            | QuireError::InvalidInput(_)
            | QuireError::Config(_) => 400,
        }
    }
}
