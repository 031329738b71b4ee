// crates/fio-ledger-core/src/core/metadata.rs
// ============================================================================
// Module: fio-ledger Metadata Edits
// Description: Validated descriptive-field edits and administrative outcomes.
// Purpose: Restrict post-hoc edits to labels and report bulk results as counts.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Only descriptive fields may be edited after ingestion: description, test
//! name, and the hostname, protocol, and drive labels. Measured metrics and
//! workload dimensions are rejected by name. Edits are applied to the history
//! and latest-state views together by the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ValidationError;
use crate::core::identifiers::ConfigIdentity;
use crate::core::identifiers::RunIdentity;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 1_000;
/// Maximum test name length in characters.
pub const MAX_TEST_NAME_LENGTH: usize = 500;
/// Maximum hostname length in characters.
pub const MAX_HOSTNAME_LENGTH: usize = 255;
/// Maximum protocol length in characters.
pub const MAX_PROTOCOL_LENGTH: usize = 100;
/// Maximum drive type length in characters.
pub const MAX_DRIVE_TYPE_LENGTH: usize = 100;
/// Maximum drive model length in characters.
pub const MAX_DRIVE_MODEL_LENGTH: usize = 255;

// ============================================================================
// SECTION: Metadata Update
// ============================================================================

/// Descriptive-field edit; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataUpdate {
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New test name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
    /// New hostname label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// New protocol label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// New drive type label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_type: Option<String>,
    /// New drive model label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_model: Option<String>,
}

impl MetadataUpdate {
    /// Builds an update from raw `field -> value` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the first field that is not an
    /// editable descriptive field, or when the result fails [`Self::validate`].
    pub fn from_fields(fields: BTreeMap<String, String>) -> Result<Self, ValidationError> {
        let mut update = Self::default();
        for (field, value) in fields {
            let slot = match field.as_str() {
                "description" => &mut update.description,
                "test_name" => &mut update.test_name,
                "hostname" => &mut update.hostname,
                "protocol" => &mut update.protocol,
                "drive_type" => &mut update.drive_type,
                "drive_model" => &mut update.drive_model,
                _ => return Err(ValidationError::new(field, "field is not editable")),
            };
            *slot = Some(value);
        }
        update.validate()?;
        Ok(update)
    }

    /// Validates field lengths and that at least one field is set.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::new("fields", "no fields to update"));
        }
        check_length("description", self.description.as_deref(), MAX_DESCRIPTION_LENGTH)?;
        check_length("test_name", self.test_name.as_deref(), MAX_TEST_NAME_LENGTH)?;
        check_length("hostname", self.hostname.as_deref(), MAX_HOSTNAME_LENGTH)?;
        check_length("protocol", self.protocol.as_deref(), MAX_PROTOCOL_LENGTH)?;
        check_length("drive_type", self.drive_type.as_deref(), MAX_DRIVE_TYPE_LENGTH)?;
        check_length("drive_model", self.drive_model.as_deref(), MAX_DRIVE_MODEL_LENGTH)?;
        if let Some(hostname) = &self.hostname
            && hostname.trim().is_empty()
        {
            return Err(ValidationError::new("hostname", "must not be empty"));
        }
        Ok(())
    }

    /// Returns `true` when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.test_name.is_none()
            && self.hostname.is_none()
            && self.protocol.is_none()
            && self.drive_type.is_none()
            && self.drive_model.is_none()
    }

    /// Names of the fields set by this edit.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        [
            ("description", self.description.is_some()),
            ("test_name", self.test_name.is_some()),
            ("hostname", self.hostname.is_some()),
            ("protocol", self.protocol.is_some()),
            ("drive_type", self.drive_type.is_some()),
            ("drive_model", self.drive_model.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

/// Checks a field against its character limit.
fn check_length(field: &str, value: Option<&str>, max: usize) -> Result<(), ValidationError> {
    match value {
        Some(value) if value.chars().count() > max => {
            Err(ValidationError::new(field, format!("exceeds {max} characters")))
        }
        _ => Ok(()),
    }
}

// ============================================================================
// SECTION: Selectors and Outcomes
// ============================================================================

/// Selects every history row sharing a derived identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "identity", rename_all = "snake_case")]
pub enum IdentitySelector {
    /// Rows sharing a configuration identity.
    Config(ConfigIdentity),
    /// Rows sharing a run identity.
    Run(RunIdentity),
}

/// Result of a metadata edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    /// History rows updated.
    pub updated: u64,
    /// Requested ids that did not exist.
    pub not_found: u64,
}

/// Result of a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    /// History rows deleted.
    pub deleted: u64,
    /// Requested ids that did not exist.
    pub not_found: u64,
}

/// Result of a retention purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeOutcome {
    /// History rows deleted.
    pub deleted_history: u64,
    /// Latest-state rows deleted.
    pub deleted_latest: u64,
    /// Latest-state rows rebuilt from remaining history.
    pub rematerialized: u64,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
