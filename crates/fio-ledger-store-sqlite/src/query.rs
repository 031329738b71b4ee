// crates/fio-ledger-store-sqlite/src/query.rs
// ============================================================================
// Module: SQLite Run Queries
// Description: Typed predicate compilation and read-only run queries.
// Purpose: Turn filter sets into parameterized SQL over the run tables.
// Dependencies: fio-ledger-core, rusqlite
// ============================================================================

//! ## Overview
//! [`RunFilter`] collects typed conditions and compiles them to a `WHERE`
//! clause whose values are always bound parameters. Column names come only
//! from the closed mappings in this module ([`filter_column`],
//! [`metric_column`]); caller text never reaches the SQL string.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fio_ledger_core::DateRange;
use fio_ledger_core::FilterField;
use fio_ledger_core::FilterSet;
use fio_ledger_core::FilterValue;
use fio_ledger_core::Pagination;
use fio_ledger_core::RunRecord;
use fio_ledger_core::ServerSummary;
use fio_ledger_core::SortOrder;
use fio_ledger_core::Timestamp;
use fio_ledger_core::TrendMetric;
use rusqlite::Connection;
use rusqlite::params_from_iter;
use rusqlite::types::FromSql;
use rusqlite::types::Value;

use crate::rows::RUN_COLUMNS;
use crate::rows::db_error;
use crate::rows::read_run_row;
use crate::store::SqliteStoreError;

// ============================================================================
// SECTION: Column Mapping
// ============================================================================

/// Run table addressed by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunTable {
    /// Append-only history.
    History,
    /// Latest-state view.
    Latest,
}

impl RunTable {
    /// Returns the table name.
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::History => "run_history",
            Self::Latest => "run_latest",
        }
    }
}

/// Returns the column backing a filter field.
pub(crate) const fn filter_column(field: FilterField) -> &'static str {
    match field {
        FilterField::Hostname => "hostname",
        FilterField::Protocol => "protocol",
        FilterField::DriveType => "drive_type",
        FilterField::DriveModel => "drive_model",
        FilterField::BlockSize => "block_size",
        FilterField::ReadWritePattern => "read_write_pattern",
        FilterField::QueueDepth => "queue_depth",
        FilterField::NumJobs => "num_jobs",
        FilterField::Direct => "direct",
        FilterField::Sync => "sync",
        FilterField::TestSize => "test_size",
        FilterField::Iodepth => "iodepth",
        FilterField::Duration => "duration",
    }
}

/// Returns the column backing a trend metric.
pub(crate) const fn metric_column(metric: TrendMetric) -> &'static str {
    match metric {
        TrendMetric::Iops => "iops",
        TrendMetric::AvgLatency => "avg_latency",
        TrendMetric::Bandwidth => "bandwidth",
        TrendMetric::P95Latency => "p95_latency",
        TrendMetric::P99Latency => "p99_latency",
    }
}

// ============================================================================
// SECTION: Filter Compiler
// ============================================================================

/// AND-combined conditions with positional parameters.
#[derive(Debug, Default)]
pub(crate) struct RunFilter {
    /// Condition fragments.
    conditions: Vec<String>,
    /// Bound values, `?1` first.
    params: Vec<Value>,
}

impl RunFilter {
    /// Creates an empty filter matching every row.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds one IN-list condition per predicate.
    pub(crate) fn with_filters(mut self, filters: &FilterSet) -> Self {
        for predicate in filters.predicates() {
            let column = filter_column(predicate.field());
            let placeholders: Vec<String> =
                predicate.values().iter().map(|value| self.bind(filter_value(value))).collect();
            self.conditions.push(format!("{column} IN ({})", placeholders.join(", ")));
        }
        self
    }

    /// Restricts `timestamp_ms` to the range bounds, both inclusive.
    pub(crate) fn with_range(mut self, range: &DateRange) -> Self {
        if let Some(start) = range.start {
            let slot = self.bind(Value::Integer(start.as_unix_millis()));
            self.conditions.push(format!("timestamp_ms >= {slot}"));
        }
        if let Some(end) = range.end {
            let slot = self.bind(Value::Integer(end.as_unix_millis()));
            self.conditions.push(format!("timestamp_ms <= {slot}"));
        }
        self
    }

    /// Adds an equality condition on a fixed column.
    pub(crate) fn with_eq(mut self, column: &'static str, value: Value) -> Self {
        let slot = self.bind(value);
        self.conditions.push(format!("{column} = {slot}"));
        self
    }

    /// Requires a fixed column to be non-null.
    pub(crate) fn with_not_null(mut self, column: &'static str) -> Self {
        self.conditions.push(format!("{column} IS NOT NULL"));
        self
    }

    /// Returns the `WHERE` clause, or an empty string when unconstrained.
    fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Binds a value and returns its placeholder.
    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("?{}", self.params.len())
    }
}

/// Converts a typed filter value into a bind value.
fn filter_value(value: &FilterValue) -> Value {
    match value {
        FilterValue::Integer(value) => Value::Integer(*value),
        FilterValue::Text(value) => Value::Text(value.clone()),
    }
}

// ============================================================================
// SECTION: Run Queries
// ============================================================================

/// Returns the `ORDER BY` clause of a sort order.
const fn order_sql(order: SortOrder) -> &'static str {
    match order {
        SortOrder::NewestFirst => " ORDER BY timestamp_ms DESC, id DESC",
        SortOrder::OldestFirst => " ORDER BY timestamp_ms ASC, id ASC",
    }
}

/// Selects decoded runs from a table.
pub(crate) fn select_runs(
    connection: &Connection,
    table: RunTable,
    filter: RunFilter,
    order: SortOrder,
    page: Option<Pagination>,
) -> Result<Vec<RunRecord>, SqliteStoreError> {
    let mut sql =
        format!("SELECT {RUN_COLUMNS} FROM {}{}{}", table.name(), filter.where_sql(), order_sql(order));
    let mut params = filter.params;
    if let Some(page) = page {
        let offset = i64::try_from(page.offset())
            .map_err(|_| SqliteStoreError::Invalid("offset exceeds i64 range".to_string()))?;
        sql.push_str(&format!(" LIMIT ?{} OFFSET ?{}", params.len() + 1, params.len() + 2));
        params.push(Value::Integer(i64::from(page.limit())));
        params.push(Value::Integer(offset));
    }
    let mut stmt = connection.prepare(&sql).map_err(db_error)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), read_run_row).map_err(db_error)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row.map_err(db_error)?.into_record()?);
    }
    Ok(records)
}

/// Counts rows of a table matching a filter.
pub(crate) fn count_runs(
    connection: &Connection,
    table: RunTable,
    filter: &RunFilter,
) -> Result<u64, SqliteStoreError> {
    let sql = format!("SELECT COUNT(*) FROM {}{}", table.name(), filter.where_sql());
    let count: i64 = connection
        .query_row(&sql, params_from_iter(filter.params.iter()), |row| row.get(0))
        .map_err(db_error)?;
    u64::try_from(count).map_err(|_| SqliteStoreError::Corrupt(format!("negative row count: {count}")))
}

// ============================================================================
// SECTION: Catalog Queries
// ============================================================================

/// Returns the sorted distinct values of a latest-state column.
pub(crate) fn distinct_latest<T: FromSql>(
    connection: &Connection,
    column: &'static str,
) -> Result<Vec<T>, SqliteStoreError> {
    let sql = format!(
        "SELECT DISTINCT {column} FROM run_latest WHERE {column} IS NOT NULL ORDER BY {column}"
    );
    let mut stmt = connection.prepare(&sql).map_err(db_error)?;
    let rows = stmt.query_map([], |row| row.get::<_, T>(0)).map_err(db_error)?;
    let mut values = Vec::new();
    for row in rows {
        values.push(row.map_err(db_error)?);
    }
    Ok(values)
}

/// Returns `hostname - protocol - drive_model` labels from the latest state.
pub(crate) fn host_disk_combinations(
    connection: &Connection,
) -> Result<Vec<String>, SqliteStoreError> {
    let mut stmt = connection
        .prepare(
            "SELECT DISTINCT hostname || ' - ' || protocol || ' - ' || drive_model AS label FROM \
             run_latest ORDER BY label",
        )
        .map_err(db_error)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0)).map_err(db_error)?;
    let mut labels = Vec::new();
    for row in rows {
        labels.push(row.map_err(db_error)?);
    }
    Ok(labels)
}

/// Groups the latest state by host and drive, most recently tested first.
pub(crate) fn server_summaries(
    connection: &Connection,
) -> Result<Vec<ServerSummary>, SqliteStoreError> {
    let mut stmt = connection
        .prepare(
            "SELECT hostname, protocol, drive_model, COUNT(*), MIN(timestamp_ms), \
             MAX(timestamp_ms) FROM run_latest GROUP BY hostname, protocol, drive_model ORDER BY \
             MAX(timestamp_ms) DESC, hostname, protocol, drive_model",
        )
        .map_err(db_error)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })
        .map_err(db_error)?;
    let mut servers = Vec::new();
    for row in rows {
        let (hostname, protocol, drive_model, count, first, last) = row.map_err(db_error)?;
        servers.push(ServerSummary {
            hostname,
            protocol,
            drive_model,
            test_count: u64::try_from(count)
                .map_err(|_| SqliteStoreError::Corrupt(format!("negative test count: {count}")))?,
            first_test: Timestamp::from_unix_millis(first),
            last_test: Timestamp::from_unix_millis(last),
        });
    }
    Ok(servers)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use fio_ledger_core::DateRange;
    use fio_ledger_core::FilterField;
    use fio_ledger_core::FilterSet;
    use fio_ledger_core::FilterValue;
    use fio_ledger_core::Timestamp;
    use rusqlite::types::Value;

    use super::RunFilter;

    #[test]
    fn empty_filter_compiles_to_no_where_clause() {
        let filter = RunFilter::new().with_filters(&FilterSet::new());
        assert_eq!(filter.where_sql(), "");
        assert!(filter.params.is_empty());
    }

    #[test]
    fn predicates_compile_to_bound_in_lists() {
        let filters = FilterSet::new()
            .parse_csv("hostname", "a, b'; DROP TABLE run_history; --")
            .unwrap()
            .with_in(FilterField::QueueDepth, [FilterValue::Integer(32)])
            .unwrap();
        let range =
            DateRange::new(Some(Timestamp::from_unix_millis(10)), Some(Timestamp::from_unix_millis(20)))
                .unwrap();
        let filter = RunFilter::new().with_filters(&filters).with_range(&range);
        assert_eq!(
            filter.where_sql(),
            " WHERE hostname IN (?1, ?2) AND queue_depth IN (?3) AND timestamp_ms >= ?4 AND \
             timestamp_ms <= ?5"
        );
        assert_eq!(filter.params.len(), 5);
        assert_eq!(filter.params[1], Value::Text("b'; DROP TABLE run_history; --".to_string()));
    }

    #[test]
    fn fixed_conditions_follow_filters() {
        let filter = RunFilter::new()
            .with_eq("hostname", Value::Text("h".to_string()))
            .with_not_null("p95_latency");
        assert_eq!(filter.where_sql(), " WHERE hostname = ?1 AND p95_latency IS NOT NULL");
    }
}
