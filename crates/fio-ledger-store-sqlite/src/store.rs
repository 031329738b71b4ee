// crates/fio-ledger-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Run Ledger
// Description: Durable RunLedgerStore backed by SQLite WAL.
// Purpose: Persist run history and the latest-state view with atomic writes.
// Dependencies: fio-ledger-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! This module implements a durable [`RunLedgerStore`] using `SQLite`. Every
//! ingested run is appended to `run_history`; `run_latest` holds one copy of
//! the newest history row per configuration tuple, enforced by a `UNIQUE`
//! constraint. Materialization, metadata edits, deletes and purges each run
//! inside one transaction, so a failure leaves both tables as they were.
//! Read paths (listings, analytics, catalogs) are plain queries.
//! Security posture: database contents are untrusted; decoding fails closed
//! with [`SqliteStoreError::Corrupt`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use fio_ledger_core::CallerIdentity;
use fio_ledger_core::ConfigTuple;
use fio_ledger_core::DateRange;
use fio_ledger_core::DeleteOutcome;
use fio_ledger_core::FilterOptions;
use fio_ledger_core::FilterSet;
use fio_ledger_core::IdentitySelector;
use fio_ledger_core::LedgerError;
use fio_ledger_core::MaterializeMode;
use fio_ledger_core::MaterializeOutcome;
use fio_ledger_core::MetadataUpdate;
use fio_ledger_core::NewRunRecord;
use fio_ledger_core::Pagination;
use fio_ledger_core::PurgeOutcome;
use fio_ledger_core::RunIdentity;
use fio_ledger_core::RunLedgerStore;
use fio_ledger_core::RunLookup;
use fio_ledger_core::RunPage;
use fio_ledger_core::RunRecord;
use fio_ledger_core::RunRecordId;
use fio_ledger_core::SaturationReport;
use fio_ledger_core::ServerSummary;
use fio_ledger_core::SortOrder;
use fio_ledger_core::SourceDigest;
use fio_ledger_core::StoreError;
use fio_ledger_core::Timestamp;
use fio_ledger_core::TrendQuery;
use fio_ledger_core::TrendReport;
use fio_ledger_core::TrendSample;
use fio_ledger_core::UpdateOutcome;
use fio_ledger_core::analyze_saturation;
use fio_ledger_core::analyze_trend;
use fio_ledger_core::config_identity;
use fio_ledger_core::run_identity;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::types::Value;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::query::RunFilter;
use crate::query::RunTable;
use crate::query::count_runs;
use crate::query::distinct_latest;
use crate::query::host_disk_combinations;
use crate::query::metric_column;
use crate::query::select_runs;
use crate::query::server_summaries;
use crate::rows::RUN_COLUMN_DEFS;
use crate::rows::db_error;
use crate::transaction::IdentityColumn;
use crate::transaction::LedgerTransaction;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the ledger.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Log target for ledger mutations.
const LOG_TARGET: &str = "fio_ledger::store";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` run ledger.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout in milliseconds.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` ledger errors.
///
/// # Invariants
/// - Error messages avoid embedding raw document payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or undecodable row.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Db(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

impl From<SqliteStoreError> for LedgerError {
    fn from(error: SqliteStoreError) -> Self {
        Self::from(StoreError::from(error))
    }
}

// ============================================================================
// SECTION: SQLite Ledger
// ============================================================================

/// `SQLite`-backed run ledger.
///
/// # Invariants
/// - All access goes through one connection guarded by a mutex.
/// - Each write method runs in exactly one transaction.
#[derive(Clone)]
pub struct SqliteRunLedger {
    /// Shared `SQLite` connection.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteRunLedger {
    /// Opens an `SQLite`-backed run ledger.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Verifies the store can execute a simple SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the mutex is poisoned or the query fails.
    pub fn readiness(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).map_err(db_error)?;
        drop(guard);
        Ok(())
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    // ------------------------------------------------------------------------
    // Materialization
    // ------------------------------------------------------------------------

    /// Runs one materialization transaction.
    fn materialize_record(
        &self,
        record: &NewRunRecord,
        mode: MaterializeMode,
    ) -> Result<MaterializeOutcome, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = LedgerTransaction::begin(&mut guard)?;
        if mode == MaterializeMode::SkipDuplicate
            && tx.contains_source(&record.tuple, &record.metadata.source_digest)?
        {
            return Ok(MaterializeOutcome::Duplicate);
        }
        let id = tx.invalidate_and_insert(record)?;
        tx.commit()?;
        drop(guard);
        Ok(MaterializeOutcome::Inserted(id))
    }

    // ------------------------------------------------------------------------
    // Listings
    // ------------------------------------------------------------------------

    /// Lists current rows matching the filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the query fails.
    pub fn list_latest(
        &self,
        filters: &FilterSet,
        pagination: Pagination,
    ) -> Result<RunPage, LedgerError> {
        self.list_page(RunTable::Latest, filters, None, SortOrder::NewestFirst, pagination)
    }

    /// Lists history rows matching the filters and date range.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the query fails.
    pub fn list_historical(
        &self,
        filters: &FilterSet,
        range: &DateRange,
        order: SortOrder,
        pagination: Pagination,
    ) -> Result<RunPage, LedgerError> {
        self.list_page(RunTable::History, filters, Some(range), order, pagination)
    }

    /// Selects one page of a run table.
    fn list_page(
        &self,
        table: RunTable,
        filters: &FilterSet,
        range: Option<&DateRange>,
        order: SortOrder,
        pagination: Pagination,
    ) -> Result<RunPage, LedgerError> {
        let build = || {
            let filter = RunFilter::new().with_filters(filters);
            match range {
                Some(range) => filter.with_range(range),
                None => filter,
            }
        };
        let guard = self.lock()?;
        let total = count_runs(&guard, table, &build())?;
        let records = select_runs(&guard, table, build(), order, Some(pagination))?;
        drop(guard);
        Ok(RunPage::new(records, total, pagination))
    }

    /// Returns every history row of a run identity in id order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the query fails.
    pub fn history_for_run(&self, run_identity: &RunIdentity) -> Result<Vec<RunRecord>, LedgerError> {
        let filter =
            RunFilter::new().with_eq("run_identity", Value::Text(run_identity.as_str().to_string()));
        let guard = self.lock()?;
        let mut records = select_runs(&guard, RunTable::History, filter, SortOrder::OldestFirst, None)?;
        drop(guard);
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    /// Fetches history rows by id.
    ///
    /// Repeated ids are looked up once. Ids without a row are reported in
    /// `not_found` rather than failing the lookup.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the query fails.
    pub fn get_runs(&self, ids: &[RunRecordId]) -> Result<RunLookup, LedgerError> {
        let mut seen = BTreeSet::new();
        let mut guard = self.lock()?;
        let tx = LedgerTransaction::begin(&mut guard)?;
        let mut lookup = RunLookup::default();
        for id in ids.iter().copied().filter(|id| seen.insert(*id)) {
            match tx.load_run(id)? {
                Some(record) => lookup.records.push(record),
                None => lookup.not_found.push(id),
            }
        }
        tx.commit()?;
        drop(guard);
        Ok(lookup)
    }

    // ------------------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------------------

    /// Computes a metric trend for a host over the query window.
    ///
    /// `now` anchors day-count windows.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the query fails. An empty window
    /// is not an error; the report carries a no-data analysis instead.
    pub fn trend(&self, query: &TrendQuery, now: Timestamp) -> Result<TrendReport, LedgerError> {
        let range = query.window.resolve(now);
        let filter = RunFilter::new()
            .with_eq("hostname", Value::Text(query.hostname.clone()))
            .with_range(&range)
            .with_not_null(metric_column(query.metric));
        let guard = self.lock()?;
        let records = select_runs(&guard, RunTable::History, filter, SortOrder::OldestFirst, None)?;
        drop(guard);
        let samples = records
            .iter()
            .filter_map(|record| TrendSample::from_record(record, query.metric))
            .collect();
        Ok(analyze_trend(query, samples))
    }

    /// Computes per-pattern saturation for one run identity.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] for a non-positive threshold,
    /// [`LedgerError::NotFound`] when the run identity has no history, and
    /// [`LedgerError::Storage`] when the query fails.
    pub fn saturation(
        &self,
        run_identity: &RunIdentity,
        threshold_ms: f64,
    ) -> Result<SaturationReport, LedgerError> {
        let records = self.history_for_run(run_identity)?;
        let report = analyze_saturation(run_identity, &records, threshold_ms)?;
        if records.is_empty() {
            return Err(LedgerError::NotFound(format!("no runs for run identity {run_identity}")));
        }
        Ok(report)
    }

    /// Returns distinct filter values over the latest-state table.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when a query fails.
    pub fn filter_options(&self) -> Result<FilterOptions, LedgerError> {
        let guard = self.lock()?;
        let options = FilterOptions {
            hostnames: distinct_latest(&guard, "hostname")?,
            protocols: distinct_latest(&guard, "protocol")?,
            drive_types: distinct_latest(&guard, "drive_type")?,
            drive_models: distinct_latest(&guard, "drive_model")?,
            host_disk_combinations: host_disk_combinations(&guard)?,
            block_sizes: distinct_latest(&guard, "block_size")?,
            patterns: distinct_latest(&guard, "read_write_pattern")?,
            queue_depths: distinct_latest(&guard, "queue_depth")?,
            num_jobs: distinct_latest(&guard, "num_jobs")?,
            directs: distinct_latest(&guard, "direct")?,
            syncs: distinct_latest(&guard, "sync")?,
            test_sizes: distinct_latest(&guard, "test_size")?,
            durations: distinct_latest(&guard, "duration")?,
        };
        drop(guard);
        Ok(options)
    }

    /// Lists host/protocol/drive groups of the latest state.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the query fails.
    pub fn list_servers(&self) -> Result<Vec<ServerSummary>, LedgerError> {
        let guard = self.lock()?;
        let servers = server_summaries(&guard)?;
        drop(guard);
        Ok(servers)
    }

    // ------------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------------

    /// Applies a descriptive-field edit to history rows by id.
    ///
    /// Both tables change together. Missing ids are counted, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] for an invalid edit and
    /// [`LedgerError::Storage`] when the transaction fails.
    pub fn update_metadata(
        &self,
        ids: &[RunRecordId],
        update: &MetadataUpdate,
        actor: Option<&CallerIdentity>,
    ) -> Result<UpdateOutcome, LedgerError> {
        update.validate()?;
        let mut guard = self.lock()?;
        let tx = LedgerTransaction::begin(&mut guard)?;
        let requested: BTreeSet<RunRecordId> = ids.iter().copied().collect();
        let outcome = apply_update(&tx, &requested, update)?;
        tx.commit()?;
        drop(guard);
        info!(
            target: LOG_TARGET,
            updated = outcome.updated,
            not_found = outcome.not_found,
            fields = ?update.field_names(),
            actor = %actor_label(actor),
            "metadata updated"
        );
        Ok(outcome)
    }

    /// Applies a descriptive-field edit to every row sharing an identity.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] when no row carries the identity,
    /// [`LedgerError::Validation`] for an invalid edit, and
    /// [`LedgerError::Storage`] when the transaction fails.
    pub fn update_by_identity(
        &self,
        selector: &IdentitySelector,
        update: &MetadataUpdate,
        actor: Option<&CallerIdentity>,
    ) -> Result<UpdateOutcome, LedgerError> {
        update.validate()?;
        let (column, value) = match selector {
            IdentitySelector::Config(identity) => (IdentityColumn::Config, identity.as_str()),
            IdentitySelector::Run(identity) => (IdentityColumn::Run, identity.as_str()),
        };
        let mut guard = self.lock()?;
        let tx = LedgerTransaction::begin(&mut guard)?;
        let ids: BTreeSet<RunRecordId> = tx.ids_with_identity(column, value)?.into_iter().collect();
        if ids.is_empty() {
            return Err(LedgerError::NotFound(format!("no runs for identity {value}")));
        }
        let outcome = apply_update(&tx, &ids, update)?;
        tx.commit()?;
        drop(guard);
        info!(
            target: LOG_TARGET,
            identity = %value,
            updated = outcome.updated,
            fields = ?update.field_names(),
            actor = %actor_label(actor),
            "metadata updated by identity"
        );
        Ok(outcome)
    }

    /// Deletes history rows by id and rebuilds affected latest rows.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the transaction fails. Missing
    /// ids are counted, never errors.
    pub fn delete(
        &self,
        ids: &[RunRecordId],
        actor: Option<&CallerIdentity>,
    ) -> Result<DeleteOutcome, LedgerError> {
        let requested: BTreeSet<RunRecordId> = ids.iter().copied().collect();
        let mut guard = self.lock()?;
        let tx = LedgerTransaction::begin(&mut guard)?;
        let mut touched = BTreeSet::new();
        let mut outcome = DeleteOutcome::default();
        for id in &requested {
            let Some(record) = tx.load_run(*id)? else {
                outcome.not_found += 1;
                continue;
            };
            if tx.delete_run(*id)? {
                touched.insert(record.tuple);
                outcome.deleted += 1;
            }
        }
        let counts = tx.rematerialize(&touched)?;
        tx.commit()?;
        drop(guard);
        info!(
            target: LOG_TARGET,
            deleted = outcome.deleted,
            not_found = outcome.not_found,
            rematerialized = counts.inserted,
            actor = %actor_label(actor),
            "runs deleted"
        );
        Ok(outcome)
    }

    /// Removes history rows older than `cutoff` and rebuilds the latest
    /// state of every affected tuple.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the transaction fails.
    pub fn purge_older_than(
        &self,
        cutoff: Timestamp,
        actor: Option<&CallerIdentity>,
    ) -> Result<PurgeOutcome, LedgerError> {
        let cutoff_ms = cutoff.as_unix_millis();
        let mut guard = self.lock()?;
        let tx = LedgerTransaction::begin(&mut guard)?;
        let tuples = tx.tuples_older_than(cutoff_ms)?;
        let deleted_latest = tx.count_latest_older_than(cutoff_ms)?;
        let deleted_history = tx.delete_older_than(cutoff_ms)?;
        let counts = tx.rematerialize(&tuples)?;
        tx.commit()?;
        drop(guard);
        let outcome = PurgeOutcome {
            deleted_history,
            deleted_latest,
            rematerialized: counts.inserted.saturating_sub(counts.removed),
        };
        info!(
            target: LOG_TARGET,
            cutoff = %cutoff,
            deleted_history = outcome.deleted_history,
            deleted_latest = outcome.deleted_latest,
            rematerialized = outcome.rematerialized,
            actor = %actor_label(actor),
            "history purged"
        );
        Ok(outcome)
    }
}

impl RunLedgerStore for SqliteRunLedger {
    fn materialize(
        &self,
        record: &NewRunRecord,
        mode: MaterializeMode,
    ) -> Result<MaterializeOutcome, StoreError> {
        Ok(self.materialize_record(record, mode)?)
    }

    fn contains_source(
        &self,
        tuple: &ConfigTuple,
        digest: &SourceDigest,
    ) -> Result<bool, StoreError> {
        let mut guard = self.lock()?;
        let tx = LedgerTransaction::begin(&mut guard)?;
        let exists = tx.contains_source(tuple, digest)?;
        drop(tx);
        drop(guard);
        Ok(exists)
    }
}

// ============================================================================
// SECTION: Update Helpers
// ============================================================================

/// Applies an edit to the requested rows inside an open transaction.
fn apply_update(
    tx: &LedgerTransaction<'_>,
    ids: &BTreeSet<RunRecordId>,
    update: &MetadataUpdate,
) -> Result<UpdateOutcome, SqliteStoreError> {
    let mut outcome = UpdateOutcome::default();
    let mut moved = BTreeSet::new();
    let mut in_place = Vec::new();
    for id in ids {
        let Some(mut record) = tx.load_run(*id)? else {
            outcome.not_found += 1;
            continue;
        };
        let previous = record.tuple.clone();
        apply_labels(&mut record, update)?;
        tx.rewrite_labels(&record)?;
        if previous == record.tuple {
            in_place.push(record.id);
        } else {
            moved.insert(previous);
            moved.insert(record.tuple);
        }
        outcome.updated += 1;
    }
    // Same-tuple rows keep their slot; moved rows rebuild old and new tuples.
    for id in in_place {
        tx.mirror_latest(id)?;
    }
    tx.rematerialize(&moved)?;
    Ok(outcome)
}

/// Applies the edit's fields to a loaded record, recomputing identities
/// when the hostname changes.
fn apply_labels(record: &mut RunRecord, update: &MetadataUpdate) -> Result<(), SqliteStoreError> {
    if let Some(description) = &update.description {
        record.metadata.description.clone_from(description);
    }
    if let Some(test_name) = &update.test_name {
        record.metadata.test_name.clone_from(test_name);
    }
    if let Some(protocol) = &update.protocol {
        record.tuple.protocol.clone_from(protocol);
    }
    if let Some(drive_type) = &update.drive_type {
        record.tuple.drive_type.clone_from(drive_type);
    }
    if let Some(drive_model) = &update.drive_model {
        record.tuple.drive_model.clone_from(drive_model);
    }
    if let Some(hostname) = &update.hostname
        && hostname != &record.tuple.hostname
    {
        record.tuple.hostname.clone_from(hostname);
        record.config_identity = config_identity(hostname);
        record.run_identity = run_identity(hostname, &record.metadata.test_date).map_err(|err| {
            SqliteStoreError::Corrupt(format!("run {} has unusable test date: {err}", record.id))
        })?;
    }
    Ok(())
}

/// Formats an optional caller for audit logs.
fn actor_label(actor: Option<&CallerIdentity>) -> String {
    actor.map_or_else(|| "anonymous".to_string(), ToString::to_string)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with durable defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability and cascades.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(db_error)?;
    Ok(())
}

/// Initializes the ledger schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS run_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    {RUN_COLUMN_DEFS}
                );
                CREATE TABLE IF NOT EXISTS run_latest (
                    id INTEGER PRIMARY KEY
                        REFERENCES run_history(id) ON DELETE CASCADE,
                    {RUN_COLUMN_DEFS},
                    UNIQUE (hostname, protocol, drive_type, drive_model, block_size,
                        read_write_pattern, queue_depth, num_jobs, direct, sync, test_size,
                        iodepth, duration)
                );
                CREATE INDEX IF NOT EXISTS idx_run_history_host_time
                    ON run_history (hostname, protocol, timestamp_ms DESC);
                CREATE INDEX IF NOT EXISTS idx_run_history_tuple
                    ON run_history (hostname, protocol, drive_type, drive_model, block_size,
                        read_write_pattern, queue_depth, num_jobs, direct, sync, test_size,
                        iodepth, duration);
                CREATE INDEX IF NOT EXISTS idx_run_history_run_identity
                    ON run_history (run_identity);
                CREATE INDEX IF NOT EXISTS idx_run_history_config_identity
                    ON run_history (config_identity);
                CREATE INDEX IF NOT EXISTS idx_run_latest_host_time
                    ON run_latest (hostname, protocol, timestamp_ms DESC);"
            ))
            .map_err(db_error)?;
        }
        Some(SCHEMA_VERSION) => {}
        Some(other) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {other}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use std::path::PathBuf;

    use super::SqliteStoreConfig;
    use super::SqliteStoreError;
    use super::SqliteStoreMode;
    use super::SqliteSyncMode;
    use super::validate_store_path;

    #[test]
    fn config_defaults_apply_when_fields_are_omitted() {
        let config: SqliteStoreConfig = serde_json::from_str(r#"{"path": "ledger.db"}"#).unwrap();
        assert_eq!(config, SqliteStoreConfig::new("ledger.db"));
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert_eq!(config.journal_mode.pragma_value(), "wal");
        assert_eq!(config.sync_mode.pragma_value(), "full");
    }

    #[test]
    fn config_rejects_unknown_fields() {
        let result: Result<SqliteStoreConfig, _> =
            serde_json::from_str(r#"{"path": "ledger.db", "pool": 4}"#);
        assert!(result.is_err());
    }

    #[test]
    fn pragma_values_cover_every_mode() {
        assert_eq!(SqliteStoreMode::Delete.pragma_value(), "delete");
        assert_eq!(SqliteSyncMode::Normal.pragma_value(), "normal");
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = validate_store_path(&PathBuf::new()).unwrap_err();
        assert_eq!(err, SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
}
