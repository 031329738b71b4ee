// crates/fio-ledger-core/src/core/identifiers.rs
// ============================================================================
// Module: fio-ledger Identifiers
// Description: Strongly typed identifiers for stored runs and derived identities.
// Purpose: Keep record ids and derived identity strings from being mixed up.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque wrappers. [`RunRecordId`] is assigned by the store
//! when a history row is appended; [`ConfigIdentity`] and [`RunIdentity`] are
//! derived deterministically from record content (see
//! [`crate::core::identity`]). Format validation happens at derivation time,
//! not in these wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Record Identifier
// ============================================================================

/// Store-assigned identifier of a history row.
///
/// # Invariants
/// - The matching latest row, when present, carries the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunRecordId(i64);

impl RunRecordId {
    /// Creates a new record identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RunRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for RunRecordId {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Derived Identities
// ============================================================================

/// Identity shared by every run on one host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigIdentity(String);

impl ConfigIdentity {
    /// Creates a new configuration identity.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ConfigIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ConfigIdentity {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Identity shared by every run on one host and calendar day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunIdentity(String);

impl RunIdentity {
    /// Creates a new run identity.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RunIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RunIdentity {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
