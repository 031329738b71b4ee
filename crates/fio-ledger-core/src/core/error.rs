// crates/fio-ledger-core/src/core/error.rs
// ============================================================================
// Module: fio-ledger Errors
// Description: Shared error taxonomy for ingestion, queries, and analysis.
// Purpose: Let every surface distinguish bad input from storage failures.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`LedgerError`] is the top-level error surfaced to callers. Malformed
//! documents, rejected parameters, missing records, and storage failures are
//! separate variants; storage failures carry a `retryable` flag so hosts can
//! decide whether to retry without inspecting messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::extract::ExtractError;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Validation Error
// ============================================================================

/// Rejected input parameter, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// Name of the offending field or parameter.
    pub field: String,
    /// Human-readable reason.
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error for a field.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// SECTION: Ledger Error
// ============================================================================

/// Errors surfaced by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Input document was not a usable FIO result.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// A parameter failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Storage backend failure.
    #[error("storage error: {message}")]
    Storage {
        /// Failure description.
        message: String,
        /// Whether retrying the operation may succeed.
        retryable: bool,
    },
}

impl From<ExtractError> for LedgerError {
    fn from(error: ExtractError) -> Self {
        match error {
            ExtractError::MalformedInput(message) => Self::MalformedInput(message),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(error: StoreError) -> Self {
        let retryable = error.is_retryable();
        match error {
            StoreError::Invalid(message) => Self::Validation(ValidationError::new("store", message)),
            other => Self::Storage {
                message: other.to_string(),
                retryable,
            },
        }
    }
}
