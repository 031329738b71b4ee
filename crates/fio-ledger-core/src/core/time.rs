// crates/fio-ledger-core/src/core/time.rs
// ============================================================================
// Module: fio-ledger Time Model
// Description: Canonical timestamp representation for ingested runs.
// Purpose: Keep ordering and window arithmetic on integer milliseconds.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Timestamps are unix epoch milliseconds. Storing integers keeps range
//! predicates and ordering exact regardless of how a textual form would be
//! rendered. The core never reads wall-clock time; hosts pass "now" in.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Milliseconds per day.
const MILLIS_PER_DAY: i64 = 86_400_000;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Unix epoch timestamp in milliseconds.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Creates a timestamp from unix seconds, saturating on overflow.
    #[must_use]
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds.saturating_mul(1_000))
    }

    /// Returns the timestamp as unix milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns the timestamp shifted back by whole days, saturating at the minimum.
    #[must_use]
    pub const fn minus_days(self, days: u32) -> Self {
        Self(self.0.saturating_sub((days as i64).saturating_mul(MILLIS_PER_DAY)))
    }

    /// Renders the timestamp as RFC 3339 in UTC.
    ///
    /// Out-of-range values fall back to the raw millisecond count.
    #[must_use]
    pub fn to_rfc3339(self) -> String {
        self.to_datetime()
            .and_then(|value| value.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.0.to_string())
    }

    /// Returns the UTC calendar date as `YYYY-MM-DD`.
    #[must_use]
    pub fn calendar_date(self) -> String {
        self.to_datetime().map_or_else(
            || "1970-01-01".to_string(),
            |value| {
                let date = value.date();
                format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
            },
        )
    }

    /// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let parsed = OffsetDateTime::parse(trimmed, &Rfc3339).ok().or_else(|| {
            if trimmed.len() == 10 {
                OffsetDateTime::parse(&format!("{trimmed}T00:00:00Z"), &Rfc3339).ok()
            } else {
                None
            }
        })?;
        let millis = parsed.unix_timestamp_nanos() / 1_000_000;
        i64::try_from(millis).ok().map(Self)
    }

    /// Converts to an `OffsetDateTime` when representable.
    fn to_datetime(self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.0) * 1_000_000).ok()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Timestamp;

    #[test]
    fn calendar_date_is_utc() {
        // 2024-03-05T23:59:59Z
        let ts = Timestamp::from_unix_seconds(1_709_683_199);
        assert_eq!(ts.calendar_date(), "2024-03-05");
    }

    #[test]
    fn parse_accepts_bare_dates() {
        let parsed = Timestamp::parse("2024-03-05");
        assert_eq!(parsed, Some(Timestamp::from_unix_seconds(1_709_596_800)));
        assert!(Timestamp::parse("not-a-date").is_none());
    }

    #[test]
    fn minus_days_saturates() {
        let ts = Timestamp::from_unix_millis(i64::MIN + 5);
        assert_eq!(ts.minus_days(1).as_unix_millis(), i64::MIN);
    }
}
