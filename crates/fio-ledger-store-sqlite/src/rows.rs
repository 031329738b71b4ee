// crates/fio-ledger-store-sqlite/src/rows.rs
// ============================================================================
// Module: SQLite Run Rows
// Description: Column layout and row mapping for run ledger tables.
// Purpose: Keep the history and latest-state tables byte-compatible.
// Dependencies: fio-ledger-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! `run_history` and `run_latest` share one column layout so a latest-state
//! row is always a verbatim copy of a history row (`INSERT ... SELECT`).
//! Rows are decoded into a flat [`StoredRun`] inside the rusqlite row closure
//! and converted to a [`RunRecord`] afterwards, so corruption surfaces as
//! [`SqliteStoreError::Corrupt`] rather than a driver error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fio_ledger_core::ConfigIdentity;
use fio_ledger_core::ConfigTuple;
use fio_ledger_core::LatencyPercentiles;
use fio_ledger_core::NewRunRecord;
use fio_ledger_core::RunIdentity;
use fio_ledger_core::RunMetadata;
use fio_ledger_core::RunMetrics;
use fio_ledger_core::RunRecord;
use fio_ledger_core::RunRecordId;
use fio_ledger_core::SourceDigest;
use fio_ledger_core::Timestamp;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::types::Value;

use crate::store::SqliteStoreError;

// ============================================================================
// SECTION: Layout
// ============================================================================

/// Column list shared by both run tables, in table order.
pub(crate) const RUN_COLUMNS: &str = "id, config_identity, run_identity, timestamp_ms, test_date, \
     hostname, protocol, drive_type, drive_model, block_size, read_write_pattern, queue_depth, \
     num_jobs, direct, sync, test_size, iodepth, duration, test_name, description, source_file, \
     source_digest, output_file, fio_version, job_runtime_ms, rwmixread, iops, avg_latency, \
     bandwidth, p95_latency, p99_latency, percentiles_json, total_ios_read, total_ios_write, \
     usr_cpu, sys_cpu";

/// Column definitions shared by both run tables, excluding `id`.
pub(crate) const RUN_COLUMN_DEFS: &str = "config_identity TEXT NOT NULL,
    run_identity TEXT NOT NULL,
    timestamp_ms INTEGER NOT NULL,
    test_date TEXT NOT NULL,
    hostname TEXT NOT NULL,
    protocol TEXT NOT NULL,
    drive_type TEXT NOT NULL,
    drive_model TEXT NOT NULL,
    block_size TEXT NOT NULL,
    read_write_pattern TEXT NOT NULL,
    queue_depth INTEGER NOT NULL,
    num_jobs INTEGER NOT NULL,
    direct INTEGER NOT NULL,
    sync INTEGER NOT NULL,
    test_size TEXT NOT NULL,
    iodepth INTEGER NOT NULL,
    duration INTEGER NOT NULL,
    test_name TEXT NOT NULL,
    description TEXT NOT NULL,
    source_file TEXT NOT NULL,
    source_digest TEXT NOT NULL,
    output_file TEXT NOT NULL,
    fio_version TEXT,
    job_runtime_ms INTEGER,
    rwmixread INTEGER,
    iops REAL,
    avg_latency REAL,
    bandwidth REAL,
    p95_latency REAL,
    p99_latency REAL,
    percentiles_json TEXT NOT NULL,
    total_ios_read INTEGER NOT NULL,
    total_ios_write INTEGER NOT NULL,
    usr_cpu REAL,
    sys_cpu REAL";

/// Configuration tuple columns, in [`tuple_values`] order.
pub(crate) const TUPLE_COLUMNS: &str = "hostname, protocol, drive_type, drive_model, block_size, \
     read_write_pattern, queue_depth, num_jobs, direct, sync, test_size, iodepth, duration";

/// Equality match on every tuple column, bound to `?1` through `?13`.
pub(crate) const TUPLE_MATCH: &str = "hostname = ?1 AND protocol = ?2 AND drive_type = ?3 AND \
     drive_model = ?4 AND block_size = ?5 AND read_write_pattern = ?6 AND queue_depth = ?7 AND \
     num_jobs = ?8 AND direct = ?9 AND sync = ?10 AND test_size = ?11 AND iodepth = ?12 AND \
     duration = ?13";

/// Returns the tuple as bind values in [`TUPLE_COLUMNS`] order.
pub(crate) fn tuple_values(tuple: &ConfigTuple) -> Vec<Value> {
    vec![
        Value::Text(tuple.hostname.clone()),
        Value::Text(tuple.protocol.clone()),
        Value::Text(tuple.drive_type.clone()),
        Value::Text(tuple.drive_model.clone()),
        Value::Text(tuple.block_size.clone()),
        Value::Text(tuple.read_write_pattern.clone()),
        Value::Integer(i64::from(tuple.queue_depth)),
        Value::Integer(i64::from(tuple.num_jobs)),
        Value::Integer(i64::from(tuple.direct)),
        Value::Integer(i64::from(tuple.sync)),
        Value::Text(tuple.test_size.clone()),
        Value::Integer(i64::from(tuple.iodepth)),
        Value::Integer(i64::from(tuple.duration_secs)),
    ]
}

/// Maps a rusqlite error into a store error.
#[allow(clippy::needless_pass_by_value, reason = "Used as a map_err adapter.")]
pub(crate) fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Writes
// ============================================================================

/// Appends a record to `run_history` and returns its assigned id.
pub(crate) fn insert_history(
    tx: &Transaction<'_>,
    record: &NewRunRecord,
) -> Result<RunRecordId, SqliteStoreError> {
    let percentiles_json = serde_json::to_string(&record.metrics.percentiles)
        .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    let tuple = &record.tuple;
    let metrics = &record.metrics;
    let metadata = &record.metadata;
    tx.execute(
        "INSERT INTO run_history (config_identity, run_identity, timestamp_ms, test_date, \
         hostname, protocol, drive_type, drive_model, block_size, read_write_pattern, \
         queue_depth, num_jobs, direct, sync, test_size, iodepth, duration, test_name, \
         description, source_file, source_digest, output_file, fio_version, job_runtime_ms, \
         rwmixread, iops, avg_latency, bandwidth, p95_latency, p99_latency, percentiles_json, \
         total_ios_read, total_ios_write, usr_cpu, sys_cpu) VALUES (?1, ?2, ?3, ?4, ?5, ?6, \
         ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, \
         ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34, ?35)",
        params![
            record.config_identity.as_str(),
            record.run_identity.as_str(),
            metadata.timestamp.as_unix_millis(),
            metadata.test_date,
            tuple.hostname,
            tuple.protocol,
            tuple.drive_type,
            tuple.drive_model,
            tuple.block_size,
            tuple.read_write_pattern,
            tuple.queue_depth,
            tuple.num_jobs,
            tuple.direct,
            tuple.sync,
            tuple.test_size,
            tuple.iodepth,
            tuple.duration_secs,
            metadata.test_name,
            metadata.description,
            metadata.source_file,
            metadata.source_digest.as_str(),
            metadata.output_file,
            metadata.fio_version,
            metadata.job_runtime_ms.map(saturating_i64),
            metadata.rwmixread,
            metrics.iops,
            metrics.avg_latency_ms,
            metrics.bandwidth_mbps,
            metrics.percentiles.p95(),
            metrics.percentiles.p99(),
            percentiles_json,
            saturating_i64(metrics.total_ios_read),
            saturating_i64(metrics.total_ios_write),
            metrics.usr_cpu,
            metrics.sys_cpu,
        ],
    )
    .map_err(db_error)?;
    Ok(RunRecordId::new(tx.last_insert_rowid()))
}

/// Converts an unsigned counter for storage, clamping at `i64::MAX`.
fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// ============================================================================
// SECTION: Reads
// ============================================================================

/// Flat row image read from either run table.
pub(crate) struct StoredRun {
    /// Row id.
    id: i64,
    /// Configuration identity.
    config_identity: String,
    /// Run identity.
    run_identity: String,
    /// Ingestion timestamp (unix millis).
    timestamp_ms: i64,
    /// Test date.
    test_date: String,
    /// Configuration tuple.
    tuple: ConfigTuple,
    /// Test name.
    test_name: String,
    /// Description.
    description: String,
    /// Source file name.
    source_file: String,
    /// Source digest.
    source_digest: String,
    /// Output file.
    output_file: String,
    /// FIO version.
    fio_version: Option<String>,
    /// Job runtime (ms).
    job_runtime_ms: Option<i64>,
    /// Read mix percentage.
    rwmixread: Option<u32>,
    /// IOPS.
    iops: Option<f64>,
    /// Average latency (ms).
    avg_latency: Option<f64>,
    /// Bandwidth (MB/s).
    bandwidth: Option<f64>,
    /// Percentile JSON.
    percentiles_json: String,
    /// Read I/O count.
    total_ios_read: i64,
    /// Write I/O count.
    total_ios_write: i64,
    /// User CPU percentage.
    usr_cpu: Option<f64>,
    /// System CPU percentage.
    sys_cpu: Option<f64>,
}

/// Reads a row selected with [`RUN_COLUMNS`].
pub(crate) fn read_run_row(row: &Row<'_>) -> rusqlite::Result<StoredRun> {
    Ok(StoredRun {
        id: row.get(0)?,
        config_identity: row.get(1)?,
        run_identity: row.get(2)?,
        timestamp_ms: row.get(3)?,
        test_date: row.get(4)?,
        tuple: read_tuple(row, 5)?,
        test_name: row.get(18)?,
        description: row.get(19)?,
        source_file: row.get(20)?,
        source_digest: row.get(21)?,
        output_file: row.get(22)?,
        fio_version: row.get(23)?,
        job_runtime_ms: row.get(24)?,
        rwmixread: row.get(25)?,
        iops: row.get(26)?,
        avg_latency: row.get(27)?,
        bandwidth: row.get(28)?,
        percentiles_json: row.get(31)?,
        total_ios_read: row.get(32)?,
        total_ios_write: row.get(33)?,
        usr_cpu: row.get(34)?,
        sys_cpu: row.get(35)?,
    })
}

/// Reads the thirteen [`TUPLE_COLUMNS`] starting at column `start`.
pub(crate) fn read_tuple(row: &Row<'_>, start: usize) -> rusqlite::Result<ConfigTuple> {
    Ok(ConfigTuple {
        hostname: row.get(start)?,
        protocol: row.get(start + 1)?,
        drive_type: row.get(start + 2)?,
        drive_model: row.get(start + 3)?,
        block_size: row.get(start + 4)?,
        read_write_pattern: row.get(start + 5)?,
        queue_depth: row.get(start + 6)?,
        num_jobs: row.get(start + 7)?,
        direct: row.get(start + 8)?,
        sync: row.get(start + 9)?,
        test_size: row.get(start + 10)?,
        iodepth: row.get(start + 11)?,
        duration_secs: row.get(start + 12)?,
    })
}

impl StoredRun {
    /// Converts the row image into a [`RunRecord`].
    ///
    /// `SQLite` stores NaN as NULL, so missing core metrics decode as NaN.
    pub(crate) fn into_record(self) -> Result<RunRecord, SqliteStoreError> {
        let percentiles: LatencyPercentiles = serde_json::from_str(&self.percentiles_json)
            .map_err(|err| {
                SqliteStoreError::Corrupt(format!("run {} percentiles: {err}", self.id))
            })?;
        let job_runtime_ms = self
            .job_runtime_ms
            .map(|value| stored_u64(self.id, "job_runtime_ms", value))
            .transpose()?;
        Ok(RunRecord {
            id: RunRecordId::new(self.id),
            config_identity: ConfigIdentity::new(self.config_identity),
            run_identity: RunIdentity::new(self.run_identity),
            tuple: self.tuple,
            metrics: RunMetrics {
                iops: self.iops.unwrap_or(f64::NAN),
                avg_latency_ms: self.avg_latency.unwrap_or(f64::NAN),
                bandwidth_mbps: self.bandwidth.unwrap_or(f64::NAN),
                percentiles,
                total_ios_read: stored_u64(self.id, "total_ios_read", self.total_ios_read)?,
                total_ios_write: stored_u64(self.id, "total_ios_write", self.total_ios_write)?,
                usr_cpu: self.usr_cpu,
                sys_cpu: self.sys_cpu,
            },
            metadata: RunMetadata {
                timestamp: Timestamp::from_unix_millis(self.timestamp_ms),
                test_date: self.test_date,
                test_name: self.test_name,
                description: self.description,
                source_file: self.source_file,
                source_digest: SourceDigest::new(self.source_digest),
                output_file: self.output_file,
                fio_version: self.fio_version,
                job_runtime_ms,
                rwmixread: self.rwmixread,
            },
        })
    }
}

/// Decodes a stored unsigned counter.
fn stored_u64(id: i64, column: &str, value: i64) -> Result<u64, SqliteStoreError> {
    u64::try_from(value)
        .map_err(|_| SqliteStoreError::Corrupt(format!("run {id} has negative {column}: {value}")))
}
