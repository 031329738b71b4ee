// crates/fio-ledger-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Run Ledger
// Description: Durable RunLedgerStore backend using SQLite.
// Purpose: Persist run history and the latest-state view transactionally.
// Dependencies: fio-ledger-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides [`SqliteRunLedger`], a SQLite-backed
//! [`fio_ledger_core::RunLedgerStore`]. History and the latest-state view are
//! two tables in one database; every write runs inside one transaction so the
//! one-current-row-per-tuple invariant survives failures and crashes. Filter
//! predicates are compiled to parameterized SQL.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod query;
mod rows;
pub mod store;
mod transaction;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteRunLedger;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
