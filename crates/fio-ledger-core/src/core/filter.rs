// crates/fio-ledger-core/src/core/filter.rs
// ============================================================================
// Module: fio-ledger Query Predicates
// Description: Typed filter predicates, date ranges, pagination, and pages.
// Purpose: Express listing queries without stringly-typed column names.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`FilterSet`] is a list of [`Predicate`]s. Each predicate is an IN-list
//! over one [`FilterField`]; predicates are AND-combined. Values are typed by
//! the field's [`FilterKind`] at construction, so storage backends can bind
//! them as parameters without re-validating.
//!
//! # Invariants
//! - A predicate never has an empty value list.
//! - Predicate values always match their field's kind.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ValidationError;
use crate::core::identifiers::RunRecordId;
use crate::core::record::ConfigTuple;
use crate::core::record::RunRecord;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum number of values in one predicate.
pub const MAX_FILTER_VALUES: usize = 256;
/// Maximum byte length of one textual filter value.
pub const MAX_FILTER_VALUE_LENGTH: usize = 255;
/// Default page size.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;
/// Maximum page size.
pub const MAX_PAGE_LIMIT: u32 = 1_000;

// ============================================================================
// SECTION: Fields
// ============================================================================

/// Value kind accepted by a filter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Free text compared by equality.
    Text,
    /// Integer compared by equality (flags are 0 or 1).
    Integer,
}

/// Filterable configuration dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    /// Hostname.
    Hostname,
    /// Protocol.
    Protocol,
    /// Drive type.
    DriveType,
    /// Drive model.
    DriveModel,
    /// Block size.
    BlockSize,
    /// Read/write pattern.
    ReadWritePattern,
    /// Queue depth.
    QueueDepth,
    /// Job count.
    NumJobs,
    /// Direct flag.
    Direct,
    /// Sync flag.
    Sync,
    /// Test size.
    TestSize,
    /// I/O depth.
    Iodepth,
    /// Duration in seconds.
    Duration,
}

impl FilterField {
    /// Returns the canonical field name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hostname => "hostname",
            Self::Protocol => "protocol",
            Self::DriveType => "drive_type",
            Self::DriveModel => "drive_model",
            Self::BlockSize => "block_size",
            Self::ReadWritePattern => "read_write_pattern",
            Self::QueueDepth => "queue_depth",
            Self::NumJobs => "num_jobs",
            Self::Direct => "direct",
            Self::Sync => "sync",
            Self::TestSize => "test_size",
            Self::Iodepth => "iodepth",
            Self::Duration => "duration",
        }
    }

    /// Returns the value kind of the field.
    #[must_use]
    pub const fn kind(self) -> FilterKind {
        match self {
            Self::Hostname
            | Self::Protocol
            | Self::DriveType
            | Self::DriveModel
            | Self::BlockSize
            | Self::ReadWritePattern
            | Self::TestSize => FilterKind::Text,
            Self::QueueDepth
            | Self::NumJobs
            | Self::Direct
            | Self::Sync
            | Self::Iodepth
            | Self::Duration => FilterKind::Integer,
        }
    }

    /// Returns the tuple's value for this field.
    #[must_use]
    pub fn value_of(self, tuple: &ConfigTuple) -> FilterValue {
        match self {
            Self::Hostname => FilterValue::Text(tuple.hostname.clone()),
            Self::Protocol => FilterValue::Text(tuple.protocol.clone()),
            Self::DriveType => FilterValue::Text(tuple.drive_type.clone()),
            Self::DriveModel => FilterValue::Text(tuple.drive_model.clone()),
            Self::BlockSize => FilterValue::Text(tuple.block_size.clone()),
            Self::ReadWritePattern => FilterValue::Text(tuple.read_write_pattern.clone()),
            Self::TestSize => FilterValue::Text(tuple.test_size.clone()),
            Self::QueueDepth => FilterValue::Integer(i64::from(tuple.queue_depth)),
            Self::NumJobs => FilterValue::Integer(i64::from(tuple.num_jobs)),
            Self::Direct => FilterValue::Integer(i64::from(tuple.direct)),
            Self::Sync => FilterValue::Integer(i64::from(tuple.sync)),
            Self::Iodepth => FilterValue::Integer(i64::from(tuple.iodepth)),
            Self::Duration => FilterValue::Integer(i64::from(tuple.duration_secs)),
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterField {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let field = match value.trim() {
            "hostname" | "hostnames" => Self::Hostname,
            "protocol" | "protocols" => Self::Protocol,
            "drive_type" | "drive_types" => Self::DriveType,
            "drive_model" | "drive_models" => Self::DriveModel,
            "block_size" | "block_sizes" => Self::BlockSize,
            "read_write_pattern" | "pattern" | "patterns" => Self::ReadWritePattern,
            "queue_depth" | "queue_depths" => Self::QueueDepth,
            "num_jobs" => Self::NumJobs,
            "direct" | "directs" => Self::Direct,
            "sync" | "syncs" => Self::Sync,
            "test_size" | "test_sizes" => Self::TestSize,
            "iodepth" => Self::Iodepth,
            "duration" | "durations" => Self::Duration,
            other => return Err(ValidationError::new(other, "unknown filter field")),
        };
        Ok(field)
    }
}

// ============================================================================
// SECTION: Predicates
// ============================================================================

/// Typed filter value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Integer value.
    Integer(i64),
    /// Text value.
    Text(String),
}

impl FilterValue {
    /// Returns the value kind.
    #[must_use]
    pub const fn kind(&self) -> FilterKind {
        match self {
            Self::Text(_) => FilterKind::Text,
            Self::Integer(_) => FilterKind::Integer,
        }
    }
}

/// IN-list predicate over one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Filtered field.
    field: FilterField,
    /// Accepted values.
    values: Vec<FilterValue>,
}

impl Predicate {
    /// Creates a validated predicate.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the field when the value list is
    /// empty, too long, holds an overlong value, or mismatches the field kind.
    pub fn new(field: FilterField, values: Vec<FilterValue>) -> Result<Self, ValidationError> {
        if values.is_empty() {
            return Err(ValidationError::new(field.name(), "no filter values"));
        }
        if values.len() > MAX_FILTER_VALUES {
            return Err(ValidationError::new(
                field.name(),
                format!("more than {MAX_FILTER_VALUES} filter values"),
            ));
        }
        for value in &values {
            if value.kind() != field.kind() {
                return Err(ValidationError::new(field.name(), "filter value has the wrong type"));
            }
            if let FilterValue::Text(text) = value
                && text.len() > MAX_FILTER_VALUE_LENGTH
            {
                return Err(ValidationError::new(
                    field.name(),
                    format!("filter value exceeds {MAX_FILTER_VALUE_LENGTH} bytes"),
                ));
            }
        }
        Ok(Self { field, values })
    }

    /// Returns the filtered field.
    #[must_use]
    pub const fn field(&self) -> FilterField {
        self.field
    }

    /// Returns the accepted values.
    #[must_use]
    pub fn values(&self) -> &[FilterValue] {
        &self.values
    }

    /// Returns `true` when the tuple satisfies the predicate.
    #[must_use]
    pub fn matches(&self, tuple: &ConfigTuple) -> bool {
        let actual = self.field.value_of(tuple);
        self.values.contains(&actual)
    }
}

/// AND-combined set of predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    /// Predicates in insertion order.
    predicates: Vec<Predicate>,
}

impl FilterSet {
    /// Creates an empty filter set matching everything.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Adds an IN-list predicate.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the predicate is invalid.
    pub fn with_in(
        mut self,
        field: FilterField,
        values: impl IntoIterator<Item = FilterValue>,
    ) -> Result<Self, ValidationError> {
        self.predicates.push(Predicate::new(field, values.into_iter().collect())?);
        Ok(self)
    }

    /// Adds a predicate parsed from a comma-separated value list.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the field is unknown or a value does
    /// not parse as the field's kind.
    pub fn parse_csv(self, field: &str, csv: &str) -> Result<Self, ValidationError> {
        let field = FilterField::from_str(field)?;
        let mut values = Vec::new();
        for raw in csv.split(',').map(str::trim).filter(|raw| !raw.is_empty()) {
            let value = match field.kind() {
                FilterKind::Text => FilterValue::Text(raw.to_string()),
                FilterKind::Integer => FilterValue::Integer(parse_integer(field, raw)?),
            };
            values.push(value);
        }
        self.with_in(field, values)
    }

    /// Returns the predicates.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Returns `true` when no predicate is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Returns `true` when the tuple satisfies every predicate.
    #[must_use]
    pub fn matches(&self, tuple: &ConfigTuple) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(tuple))
    }
}

/// Parses an integer filter value; flags also accept `true`/`false`.
fn parse_integer(field: FilterField, raw: &str) -> Result<i64, ValidationError> {
    match raw {
        "true" if matches!(field, FilterField::Direct | FilterField::Sync) => Ok(1),
        "false" if matches!(field, FilterField::Direct | FilterField::Sync) => Ok(0),
        _ => raw
            .parse::<i64>()
            .map_err(|_| ValidationError::new(field.name(), format!("'{raw}' is not an integer"))),
    }
}

// ============================================================================
// SECTION: Date Range
// ============================================================================

/// Inclusive timestamp range; open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Inclusive lower bound.
    pub start: Option<Timestamp>,
    /// Inclusive upper bound.
    pub end: Option<Timestamp>,
}

impl DateRange {
    /// Creates a validated range.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when `start` is after `end`.
    pub fn new(start: Option<Timestamp>, end: Option<Timestamp>) -> Result<Self, ValidationError> {
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(ValidationError::new("date_range", "start is after end"));
        }
        Ok(Self { start, end })
    }

    /// Returns `true` when the timestamp falls inside the range.
    #[must_use]
    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.start.is_none_or(|start| timestamp >= start) && self.end.is_none_or(|end| timestamp <= end)
    }
}

// ============================================================================
// SECTION: Pagination
// ============================================================================

/// Listing sort order by timestamp, then id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Newest rows first.
    #[default]
    NewestFirst,
    /// Oldest rows first.
    OldestFirst,
}

/// Validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum rows returned.
    limit: u32,
    /// Rows skipped.
    offset: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Creates a validated page window.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the limit is outside `1..=1000`.
    pub fn new(limit: Option<u32>, offset: Option<u64>) -> Result<Self, ValidationError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(ValidationError::new("limit", format!("must be between 1 and {MAX_PAGE_LIMIT}")));
        }
        Ok(Self {
            limit,
            offset: offset.unwrap_or(0),
        })
    }

    /// Returns the limit.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    /// Returns the offset.
    #[must_use]
    pub const fn offset(self) -> u64 {
        self.offset
    }
}

/// One page of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPage {
    /// Records in the page.
    pub records: Vec<RunRecord>,
    /// Total matching rows.
    pub total: u64,
    /// Applied limit.
    pub limit: u32,
    /// Applied offset.
    pub offset: u64,
    /// Whether more rows follow this page.
    pub has_more: bool,
}

impl RunPage {
    /// Builds a page from the selected records and the total match count.
    #[must_use]
    pub fn new(records: Vec<RunRecord>, total: u64, pagination: Pagination) -> Self {
        let shown = pagination.offset.saturating_add(records.len() as u64);
        Self {
            records,
            total,
            limit: pagination.limit,
            offset: pagination.offset,
            has_more: shown < total,
        }
    }
}

/// Outcome of fetching history rows by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunLookup {
    /// Rows found, in request order without repeats.
    pub records: Vec<RunRecord>,
    /// Requested ids with no history row.
    pub not_found: Vec<RunRecordId>,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
