// crates/fio-ledger-core/src/runtime/mod.rs
// ============================================================================
// Module: fio-ledger Runtime
// Description: Ingestion pipeline, analyzers, and the in-memory ledger.
// Purpose: Drive extraction through materialization and analyze stored runs.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime wires the core types together: [`RunIngestor`] runs
//! extraction, identity derivation, and materialization against any
//! [`crate::interfaces::RunLedgerStore`]; [`analyze_trend`] and
//! [`analyze_saturation`] are pure functions over historical rows.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod ingest;
pub mod memory;
pub mod saturation;
pub mod trend;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use ingest::BulkIngestItem;
pub use ingest::BulkIngestReport;
pub use ingest::BulkIngestRequest;
pub use ingest::BulkItemError;
pub use ingest::IngestOverrides;
pub use ingest::IngestPreview;
pub use ingest::IngestRequest;
pub use ingest::RunIngestor;
pub use memory::InMemoryRunLedger;
pub use saturation::PatternSaturation;
pub use saturation::SaturationReport;
pub use saturation::SaturationStep;
pub use saturation::analyze_saturation;
pub use trend::MetricReading;
pub use trend::PercentChange;
pub use trend::PerformanceData;
pub use trend::TrendAnalysis;
pub use trend::TrendMetric;
pub use trend::TrendPoint;
pub use trend::TrendQuery;
pub use trend::TrendReport;
pub use trend::TrendSample;
pub use trend::TrendSummary;
pub use trend::TrendWindow;
pub use trend::analyze_trend;
pub use trend::performance_data;
