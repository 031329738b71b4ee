// crates/fio-ledger-config/src/lib.rs
// ============================================================================
// Module: fio-ledger Config Library
// Description: Canonical config model and fail-closed validation.
// Purpose: Single source of truth for fio-ledger.toml semantics.
// Dependencies: fio-ledger-core, fio-ledger-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `fio-ledger-config` defines the configuration model for the ledger: the
//! `SQLite` store, ingestion limits, analysis defaults, retention, and log
//! level. Loading enforces path, size, and encoding limits before parsing,
//! and every section validates itself before the config is handed out.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
