// crates/fio-ledger-core/src/core/identity.rs
// ============================================================================
// Module: fio-ledger Identity Derivation
// Description: Deterministic identities and content digests for ingested runs.
// Purpose: Group runs by host and by host-day without any stored state.
// Dependencies: serde, serde_jcs, sha2, uuid
// ============================================================================

//! ## Overview
//! Identities are pure functions of record content. The input string is
//! hashed with SHA-256, the first 16 digest bytes are stamped with UUID
//! version 5 and the RFC 4122 variant, and the result is rendered in the
//! canonical lowercase hyphenated form.
//!
//! - Configuration identity: derived from the hostname alone.
//! - Run identity: derived from `"{hostname}_{date}"` where `date` is the
//!   calendar-date prefix of the test date.
//!
//! Source digests hash the RFC 8785 canonical form of the input document so
//! re-imports of the same file are detectable regardless of key order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use uuid::Builder;

use crate::core::error::ValidationError;
use crate::core::identifiers::ConfigIdentity;
use crate::core::identifiers::RunIdentity;

// ============================================================================
// SECTION: Identity Derivation
// ============================================================================

/// Derives a UUID-shaped identity string from arbitrary input.
///
/// # Invariants
/// - Equal inputs always produce equal outputs.
/// - Output matches `xxxxxxxx-xxxx-5xxx-[89ab]xxx-xxxxxxxxxxxx`.
#[must_use]
pub fn derive_identity(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut bytes = [0_u8; 16];
    bytes.copy_from_slice(&digest[.. 16]);
    Builder::from_sha1_bytes(bytes).into_uuid().hyphenated().to_string()
}

/// Derives the configuration identity for a hostname.
#[must_use]
pub fn config_identity(hostname: &str) -> ConfigIdentity {
    ConfigIdentity::new(derive_identity(hostname))
}

/// Derives the run identity for a hostname and test date.
///
/// # Errors
///
/// Returns [`ValidationError`] when the test date has no calendar-date part.
pub fn run_identity(hostname: &str, test_date: &str) -> Result<RunIdentity, ValidationError> {
    let date = calendar_date_part(test_date)?;
    Ok(RunIdentity::new(derive_identity(&format!("{hostname}_{date}"))))
}

/// Returns the calendar-date prefix of an ISO-like date string.
///
/// Splits at the first `T` or space; a bare date is returned unchanged.
///
/// # Errors
///
/// Returns [`ValidationError`] when the prefix is empty.
pub fn calendar_date_part(test_date: &str) -> Result<&str, ValidationError> {
    let trimmed = test_date.trim();
    let date = trimmed.split(['T', ' ']).next().unwrap_or_default();
    if date.is_empty() {
        return Err(ValidationError::new("test_date", "missing calendar date"));
    }
    Ok(date)
}

// ============================================================================
// SECTION: Source Digest
// ============================================================================

/// Lowercase hex SHA-256 digest of a canonicalized source document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceDigest(String);

impl SourceDigest {
    /// Wraps an existing hex digest.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the digest as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Computes the source digest of a JSON document.
///
/// # Errors
///
/// Returns [`ValidationError`] when the document cannot be canonicalized.
pub fn source_digest(document: &Value) -> Result<SourceDigest, ValidationError> {
    let bytes = serde_jcs::to_vec(document)
        .map_err(|err| ValidationError::new("document", err.to_string()))?;
    Ok(SourceDigest(hex_encode(&Sha256::digest(&bytes))))
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
