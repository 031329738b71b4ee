// crates/fio-ledger-store-sqlite/src/transaction.rs
// ============================================================================
// Module: SQLite Ledger Transaction
// Description: Unit of work spanning the history and latest-state tables.
// Purpose: Make invalidate-then-insert a single operation on one transaction.
// Dependencies: fio-ledger-core, rusqlite
// ============================================================================

//! ## Overview
//! [`LedgerTransaction`] wraps one `SQLite` transaction and exposes the only
//! write shapes the ledger needs. Every method keeps both tables consistent
//! relative to each other at commit time; dropping the value without calling
//! [`LedgerTransaction::commit`] rolls everything back.
//!
//! # Invariants
//! - `run_latest` holds at most one row per configuration tuple (`UNIQUE`).
//! - A `run_latest` row is a column-for-column copy of a `run_history` row.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use fio_ledger_core::ConfigTuple;
use fio_ledger_core::NewRunRecord;
use fio_ledger_core::RunRecord;
use fio_ledger_core::RunRecordId;
use fio_ledger_core::SourceDigest;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::rows::RUN_COLUMNS;
use crate::rows::StoredRun;
use crate::rows::TUPLE_COLUMNS;
use crate::rows::TUPLE_MATCH;
use crate::rows::db_error;
use crate::rows::insert_history;
use crate::rows::read_run_row;
use crate::rows::read_tuple;
use crate::rows::tuple_values;
use crate::store::SqliteStoreError;

// ============================================================================
// SECTION: Rematerialization Counts
// ============================================================================

/// Latest-state rows touched by [`LedgerTransaction::rematerialize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Rematerialized {
    /// Latest rows removed before rebuilding.
    pub(crate) removed: u64,
    /// Latest rows rebuilt from history.
    pub(crate) inserted: u64,
}

// ============================================================================
// SECTION: Transaction
// ============================================================================

/// One atomic unit of work over both run tables.
pub(crate) struct LedgerTransaction<'conn> {
    /// Underlying transaction.
    tx: Transaction<'conn>,
}

impl<'conn> LedgerTransaction<'conn> {
    /// Begins a transaction on the connection.
    pub(crate) fn begin(connection: &'conn mut Connection) -> Result<Self, SqliteStoreError> {
        let tx = connection.transaction().map_err(db_error)?;
        Ok(Self { tx })
    }

    /// Commits both tables.
    pub(crate) fn commit(self) -> Result<(), SqliteStoreError> {
        self.tx.commit().map_err(db_error)
    }

    /// Returns `true` when history holds the tuple with the source digest.
    pub(crate) fn contains_source(
        &self,
        tuple: &ConfigTuple,
        digest: &SourceDigest,
    ) -> Result<bool, SqliteStoreError> {
        let mut values = tuple_values(tuple);
        values.push(Value::Text(digest.as_str().to_string()));
        self.tx
            .query_row(
                &format!(
                    "SELECT EXISTS(SELECT 1 FROM run_history WHERE {TUPLE_MATCH} AND source_digest \
                     = ?14)"
                ),
                params_from_iter(values.iter()),
                |row| row.get::<_, bool>(0),
            )
            .map_err(db_error)
    }

    /// Appends the record to history, invalidates the tuple's current row,
    /// and promotes the new history row in its place.
    pub(crate) fn invalidate_and_insert(
        &self,
        record: &NewRunRecord,
    ) -> Result<RunRecordId, SqliteStoreError> {
        let id = insert_history(&self.tx, record)?;
        self.tx
            .execute(
                &format!("DELETE FROM run_latest WHERE {TUPLE_MATCH}"),
                params_from_iter(tuple_values(&record.tuple).iter()),
            )
            .map_err(db_error)?;
        let promoted = self
            .tx
            .execute(
                &format!(
                    "INSERT INTO run_latest ({RUN_COLUMNS}) SELECT {RUN_COLUMNS} FROM run_history \
                     WHERE id = ?1"
                ),
                params![id.get()],
            )
            .map_err(db_error)?;
        if promoted != 1 {
            return Err(SqliteStoreError::Corrupt(format!("history row {id} vanished before promotion")));
        }
        Ok(id)
    }

    /// Loads one history row.
    pub(crate) fn load_run(&self, id: RunRecordId) -> Result<Option<RunRecord>, SqliteStoreError> {
        let stored = self
            .tx
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM run_history WHERE id = ?1"),
                params![id.get()],
                read_run_row,
            )
            .optional()
            .map_err(db_error)?;
        stored.map(StoredRun::into_record).transpose()
    }

    /// Returns history ids whose identity column equals `value`, ascending.
    pub(crate) fn ids_with_identity(
        &self,
        column: IdentityColumn,
        value: &str,
    ) -> Result<Vec<RunRecordId>, SqliteStoreError> {
        let mut stmt = self
            .tx
            .prepare(&format!("SELECT id FROM run_history WHERE {} = ?1 ORDER BY id", column.name()))
            .map_err(db_error)?;
        let rows = stmt.query_map(params![value], |row| row.get::<_, i64>(0)).map_err(db_error)?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(RunRecordId::new(row.map_err(db_error)?));
        }
        Ok(ids)
    }

    /// Rewrites the descriptive and identity columns of a history row.
    pub(crate) fn rewrite_labels(&self, record: &RunRecord) -> Result<(), SqliteStoreError> {
        self.tx
            .execute(
                "UPDATE run_history SET config_identity = ?1, run_identity = ?2, hostname = ?3, \
                 protocol = ?4, drive_type = ?5, drive_model = ?6, test_name = ?7, description = \
                 ?8 WHERE id = ?9",
                params![
                    record.config_identity.as_str(),
                    record.run_identity.as_str(),
                    record.tuple.hostname,
                    record.tuple.protocol,
                    record.tuple.drive_type,
                    record.tuple.drive_model,
                    record.metadata.test_name,
                    record.metadata.description,
                    record.id.get(),
                ],
            )
            .map_err(db_error)?;
        Ok(())
    }

    /// Re-copies a history row over its latest-state copy, if it has one.
    pub(crate) fn mirror_latest(&self, id: RunRecordId) -> Result<(), SqliteStoreError> {
        let removed = self
            .tx
            .execute("DELETE FROM run_latest WHERE id = ?1", params![id.get()])
            .map_err(db_error)?;
        if removed > 0 {
            self.tx
                .execute(
                    &format!(
                        "INSERT INTO run_latest ({RUN_COLUMNS}) SELECT {RUN_COLUMNS} FROM \
                         run_history WHERE id = ?1"
                    ),
                    params![id.get()],
                )
                .map_err(db_error)?;
        }
        Ok(())
    }

    /// Deletes one history row; its latest copy cascades.
    pub(crate) fn delete_run(&self, id: RunRecordId) -> Result<bool, SqliteStoreError> {
        let deleted = self
            .tx
            .execute("DELETE FROM run_history WHERE id = ?1", params![id.get()])
            .map_err(db_error)?;
        Ok(deleted > 0)
    }

    /// Returns the distinct tuples of history rows older than `cutoff_ms`.
    pub(crate) fn tuples_older_than(
        &self,
        cutoff_ms: i64,
    ) -> Result<BTreeSet<ConfigTuple>, SqliteStoreError> {
        let mut stmt = self
            .tx
            .prepare(&format!(
                "SELECT DISTINCT {TUPLE_COLUMNS} FROM run_history WHERE timestamp_ms < ?1"
            ))
            .map_err(db_error)?;
        let rows = stmt.query_map(params![cutoff_ms], |row| read_tuple(row, 0)).map_err(db_error)?;
        let mut tuples = BTreeSet::new();
        for row in rows {
            tuples.insert(row.map_err(db_error)?);
        }
        Ok(tuples)
    }

    /// Counts latest-state rows older than `cutoff_ms`.
    pub(crate) fn count_latest_older_than(&self, cutoff_ms: i64) -> Result<u64, SqliteStoreError> {
        let count: i64 = self
            .tx
            .query_row(
                "SELECT COUNT(*) FROM run_latest WHERE timestamp_ms < ?1",
                params![cutoff_ms],
                |row| row.get(0),
            )
            .map_err(db_error)?;
        u64::try_from(count).map_err(|_| SqliteStoreError::Corrupt(format!("negative row count: {count}")))
    }

    /// Deletes history rows older than `cutoff_ms`; latest copies cascade.
    pub(crate) fn delete_older_than(&self, cutoff_ms: i64) -> Result<u64, SqliteStoreError> {
        let deleted = self
            .tx
            .execute("DELETE FROM run_history WHERE timestamp_ms < ?1", params![cutoff_ms])
            .map_err(db_error)?;
        Ok(deleted as u64)
    }

    /// Rebuilds the latest row of each tuple from its highest history id.
    ///
    /// All tuples are cleared before any is rebuilt so a row whose tuple
    /// changed never collides with its own stale copy.
    pub(crate) fn rematerialize(
        &self,
        tuples: &BTreeSet<ConfigTuple>,
    ) -> Result<Rematerialized, SqliteStoreError> {
        let mut counts = Rematerialized::default();
        for tuple in tuples {
            let removed = self
                .tx
                .execute(
                    &format!("DELETE FROM run_latest WHERE {TUPLE_MATCH}"),
                    params_from_iter(tuple_values(tuple).iter()),
                )
                .map_err(db_error)?;
            counts.removed += removed as u64;
        }
        for tuple in tuples {
            let inserted = self
                .tx
                .execute(
                    &format!(
                        "INSERT INTO run_latest ({RUN_COLUMNS}) SELECT {RUN_COLUMNS} FROM \
                         run_history WHERE {TUPLE_MATCH} ORDER BY id DESC LIMIT 1"
                    ),
                    params_from_iter(tuple_values(tuple).iter()),
                )
                .map_err(db_error)?;
            counts.inserted += inserted as u64;
        }
        Ok(counts)
    }
}

// ============================================================================
// SECTION: Identity Columns
// ============================================================================

/// Derived-identity column used to select history rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdentityColumn {
    /// `config_identity`.
    Config,
    /// `run_identity`.
    Run,
}

impl IdentityColumn {
    /// Returns the column name.
    const fn name(self) -> &'static str {
        match self {
            Self::Config => "config_identity",
            Self::Run => "run_identity",
        }
    }
}
