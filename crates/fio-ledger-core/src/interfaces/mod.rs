// crates/fio-ledger-core/src/interfaces/mod.rs
// ============================================================================
// Module: fio-ledger Interfaces
// Description: Backend-agnostic storage contract for the ingestion pipeline.
// Purpose: Define the single unit-of-work the pipeline needs from a store.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The pipeline needs exactly one write operation from a backend:
//! [`RunLedgerStore::materialize`], which appends to history and replaces the
//! latest-state row for the record's tuple as one atomic unit. Exposing the
//! pair as a single call keeps the latest-state invariant out of caller
//! discipline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::RunRecordId;
use crate::core::identity::SourceDigest;
use crate::core::record::ConfigTuple;
use crate::core::record::NewRunRecord;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Run ledger store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("run ledger store io error: {0}")]
    Io(String),
    /// Database or transaction failure.
    #[error("run ledger store database error: {0}")]
    Db(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("run ledger store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("run ledger store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store input is invalid.
    #[error("run ledger store invalid data: {0}")]
    Invalid(String),
}

impl StoreError {
    /// Returns `true` when retrying the operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Db(_))
    }
}

// ============================================================================
// SECTION: Run Ledger Store
// ============================================================================

/// Duplicate handling for [`RunLedgerStore::materialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeMode {
    /// Always append and replace the latest row.
    Always,
    /// Skip when history already holds the same tuple and source digest.
    SkipDuplicate,
}

/// Result of a materialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeOutcome {
    /// The record was appended and is now current for its tuple.
    Inserted(RunRecordId),
    /// The record was skipped as a duplicate; nothing changed.
    Duplicate,
}

/// Persistent run ledger: append-only history plus latest-state view.
///
/// # Invariants
/// - After any sequence of successful calls, each tuple with history has
///   exactly one latest-state row, carrying the newest history id for it.
/// - A failed call leaves both views as they were before the call.
pub trait RunLedgerStore {
    /// Appends the record to history and makes it current for its tuple,
    /// atomically. Under [`MaterializeMode::SkipDuplicate`] the duplicate
    /// check runs inside the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the transaction fails; nothing is applied.
    fn materialize(
        &self,
        record: &NewRunRecord,
        mode: MaterializeMode,
    ) -> Result<MaterializeOutcome, StoreError>;

    /// Returns `true` when history holds a row with the tuple and digest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn contains_source(&self, tuple: &ConfigTuple, digest: &SourceDigest)
    -> Result<bool, StoreError>;
}
