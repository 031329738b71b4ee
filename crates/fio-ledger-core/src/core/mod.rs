// crates/fio-ledger-core/src/core/mod.rs
// ============================================================================
// Module: fio-ledger Core Types
// Description: Canonical run records, identities, filters, and errors.
// Purpose: Provide stable, serializable types shared by every ledger surface.
// Dependencies: serde, serde_json, sha2, time, uuid
// ============================================================================

//! ## Overview
//! Core types describe one benchmark execution ([`RunRecord`]), the
//! configuration tuple that groups executions into a latest-state row, the
//! derived identities, and the typed predicates used to query stored runs.
//! These types are the canonical source of truth for derived API surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod caller;
pub mod error;
pub mod extract;
pub mod filter;
pub mod identifiers;
pub mod identity;
pub mod metadata;
pub mod record;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use caller::CallerCache;
pub use caller::CallerIdentity;
pub use caller::CallerRole;
pub use caller::credential_fingerprint;
pub use error::LedgerError;
pub use error::ValidationError;
pub use extract::ExtractError;
pub use extract::ExtractedRun;
pub use extract::extract_run;
pub use filter::DateRange;
pub use filter::FilterField;
pub use filter::FilterKind;
pub use filter::FilterSet;
pub use filter::FilterValue;
pub use filter::Pagination;
pub use filter::Predicate;
pub use filter::RunLookup;
pub use filter::RunPage;
pub use filter::SortOrder;
pub use identifiers::ConfigIdentity;
pub use identifiers::RunIdentity;
pub use identifiers::RunRecordId;
pub use identity::SourceDigest;
pub use identity::calendar_date_part;
pub use identity::config_identity;
pub use identity::derive_identity;
pub use identity::run_identity;
pub use identity::source_digest;
pub use metadata::DeleteOutcome;
pub use metadata::IdentitySelector;
pub use metadata::MetadataUpdate;
pub use metadata::PurgeOutcome;
pub use metadata::UpdateOutcome;
pub use record::ConfigTuple;
pub use record::FilterOptions;
pub use record::LatencyPercentiles;
pub use record::NewRunRecord;
pub use record::PERCENTILE_LEVELS;
pub use record::PercentileLevel;
pub use record::RunMetadata;
pub use record::RunMetrics;
pub use record::RunRecord;
pub use record::ServerSummary;
pub use time::Timestamp;
