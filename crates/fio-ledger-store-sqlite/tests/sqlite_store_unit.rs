// crates/fio-ledger-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Store Unit Tests
// Description: Path validation and schema version checks.
// Purpose: Ensure the ledger refuses unusable paths and foreign schemas.
// Dependencies: fio-ledger-store-sqlite, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! Opening failures for [`SqliteRunLedger`]: invalid paths and unsupported
//! on-disk schema versions must fail closed before any run is written.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;
use std::path::PathBuf;

use fio_ledger_core::LedgerError;
use fio_ledger_store_sqlite::SqliteRunLedger;
use fio_ledger_store_sqlite::SqliteStoreConfig;
use fio_ledger_store_sqlite::SqliteStoreError;
use fio_ledger_store_sqlite::SqliteStoreMode;
use fio_ledger_store_sqlite::SqliteSyncMode;
use rusqlite::Connection;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn config_for_path(path: &Path) -> SqliteStoreConfig {
    SqliteStoreConfig {
        path: path.to_path_buf(),
        busy_timeout_ms: 1_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    }
}

// ============================================================================
// SECTION: Path Validation
// ============================================================================

#[test]
fn sqlite_store_rejects_directory_path() {
    let temp = TempDir::new().unwrap();
    let Err(err) = SqliteRunLedger::new(config_for_path(temp.path())) else {
        panic!("expected directory path rejection");
    };
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn sqlite_store_rejects_empty_path() {
    let Err(err) = SqliteRunLedger::new(config_for_path(&PathBuf::new())) else {
        panic!("expected empty path rejection");
    };
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn sqlite_store_rejects_overlong_component() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a".repeat(256)).join("ledger.sqlite");
    let Err(err) = SqliteRunLedger::new(config_for_path(&path)) else {
        panic!("expected overlong component rejection");
    };
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn sqlite_store_creates_missing_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("deeper").join("ledger.sqlite");
    SqliteRunLedger::new(config_for_path(&path)).unwrap();
    assert!(path.is_file());
}

// ============================================================================
// SECTION: Schema Version
// ============================================================================

#[test]
fn sqlite_store_rejects_unknown_schema_version() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE store_meta (version INTEGER NOT NULL); INSERT INTO store_meta (version) \
             VALUES (999);",
        )
        .unwrap();
    }
    let Err(err) = SqliteRunLedger::new(config_for_path(&path)) else {
        panic!("expected schema version mismatch");
    };
    assert!(matches!(err, SqliteStoreError::VersionMismatch(_)));
    let ledger_err = LedgerError::from(err);
    assert!(matches!(ledger_err, LedgerError::Storage { retryable: false, .. }));
}

#[test]
fn sqlite_store_reopens_its_own_schema() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    drop(SqliteRunLedger::new(config_for_path(&path)).unwrap());
    let ledger = SqliteRunLedger::new(config_for_path(&path)).unwrap();
    assert!(path.is_file());
    ledger.readiness().unwrap();
}
