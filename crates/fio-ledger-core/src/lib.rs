// crates/fio-ledger-core/src/lib.rs
// ============================================================================
// Module: fio-ledger Core Library
// Description: Public API surface for the fio-ledger core.
// Purpose: Expose domain types, the ingestion pipeline, and analyzers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! fio-ledger ingests FIO benchmark result documents, derives stable
//! configuration and run identities, and materializes a "latest result per
//! configuration" view next to an append-only history. Trend and saturation
//! analysis are pure functions over historical rows. Storage backends plug in
//! through [`RunLedgerStore`]; the core itself performs no I/O and never reads
//! wall-clock time.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::MaterializeMode;
pub use interfaces::MaterializeOutcome;
pub use interfaces::RunLedgerStore;
pub use interfaces::StoreError;
pub use runtime::BulkIngestItem;
pub use runtime::BulkIngestReport;
pub use runtime::BulkIngestRequest;
pub use runtime::BulkItemError;
pub use runtime::InMemoryRunLedger;
pub use runtime::IngestOverrides;
pub use runtime::IngestPreview;
pub use runtime::IngestRequest;
pub use runtime::PatternSaturation;
pub use runtime::MetricReading;
pub use runtime::PercentChange;
pub use runtime::PerformanceData;
pub use runtime::RunIngestor;
pub use runtime::SaturationReport;
pub use runtime::SaturationStep;
pub use runtime::TrendAnalysis;
pub use runtime::TrendMetric;
pub use runtime::TrendPoint;
pub use runtime::TrendQuery;
pub use runtime::TrendReport;
pub use runtime::TrendSample;
pub use runtime::TrendSummary;
pub use runtime::TrendWindow;
pub use runtime::analyze_saturation;
pub use runtime::analyze_trend;
pub use runtime::performance_data;
