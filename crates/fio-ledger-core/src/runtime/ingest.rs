// crates/fio-ledger-core/src/runtime/ingest.rs
// ============================================================================
// Module: fio-ledger Ingestion Pipeline
// Description: Single and bulk ingestion over a run ledger store.
// Purpose: Run extraction, identity derivation, and materialization per file.
// Dependencies: crate::core, crate::interfaces, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`RunIngestor`] turns one FIO document into a [`NewRunRecord`] and hands it
//! to the store as a single materialization. Bulk ingestion processes items
//! sequentially with one store transaction each: a bad item is counted and
//! logged, never fatal to the batch, and earlier commits stay committed.
//!
//! Without `overwrite`, an item whose tuple and source digest already exist in
//! history is skipped. A dry run extracts and derives identities but never
//! writes; it returns previews instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::core::caller::CallerIdentity;
use crate::core::error::LedgerError;
use crate::core::error::ValidationError;
use crate::core::extract::extract_run;
use crate::core::identifiers::ConfigIdentity;
use crate::core::identifiers::RunIdentity;
use crate::core::identifiers::RunRecordId;
use crate::core::identity::calendar_date_part;
use crate::core::identity::config_identity;
use crate::core::identity::run_identity;
use crate::core::identity::SourceDigest;
use crate::core::identity::source_digest;
use crate::core::metadata::MAX_DESCRIPTION_LENGTH;
use crate::core::metadata::MAX_DRIVE_MODEL_LENGTH;
use crate::core::metadata::MAX_DRIVE_TYPE_LENGTH;
use crate::core::metadata::MAX_HOSTNAME_LENGTH;
use crate::core::metadata::MAX_PROTOCOL_LENGTH;
use crate::core::record::ConfigTuple;
use crate::core::record::NewRunRecord;
use crate::core::record::RunMetadata;
use crate::core::record::RunMetrics;
use crate::core::time::Timestamp;
use crate::interfaces::MaterializeMode;
use crate::interfaces::MaterializeOutcome;
use crate::interfaces::RunLedgerStore;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Caller-supplied values that take precedence over extracted ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestOverrides {
    /// Hostname.
    #[serde(default)]
    pub hostname: Option<String>,
    /// Protocol label.
    #[serde(default)]
    pub protocol: Option<String>,
    /// Drive type label.
    #[serde(default)]
    pub drive_type: Option<String>,
    /// Drive model label.
    #[serde(default)]
    pub drive_model: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Test date (RFC 3339 or `YYYY-MM-DD`).
    #[serde(default)]
    pub test_date: Option<String>,
}

impl IngestOverrides {
    /// Validates override lengths and the test date.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let limits = [
            ("hostname", self.hostname.as_deref(), MAX_HOSTNAME_LENGTH),
            ("protocol", self.protocol.as_deref(), MAX_PROTOCOL_LENGTH),
            ("drive_type", self.drive_type.as_deref(), MAX_DRIVE_TYPE_LENGTH),
            ("drive_model", self.drive_model.as_deref(), MAX_DRIVE_MODEL_LENGTH),
            ("description", self.description.as_deref(), MAX_DESCRIPTION_LENGTH),
        ];
        for (field, value, max) in limits {
            if value.is_some_and(|value| value.chars().count() > max) {
                return Err(ValidationError::new(field, format!("exceeds {max} characters")));
            }
        }
        if let Some(date) = non_blank(self.test_date.as_deref()) {
            let day = calendar_date_part(date)?;
            if Timestamp::parse(day).is_none() {
                return Err(ValidationError::new("test_date", format!("not a calendar date: {date}")));
            }
        }
        Ok(())
    }

    /// Applies non-blank label overrides to a tuple.
    fn apply(&self, tuple: &mut ConfigTuple) {
        let pairs = [
            (&mut tuple.hostname, &self.hostname),
            (&mut tuple.protocol, &self.protocol),
            (&mut tuple.drive_type, &self.drive_type),
            (&mut tuple.drive_model, &self.drive_model),
        ];
        for (slot, value) in pairs {
            if let Some(value) = non_blank(value.as_deref()) {
                *slot = value.to_string();
            }
        }
    }
}

/// Single-document ingestion request.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// Source file name, used for the default description and logs.
    pub source_name: String,
    /// Parsed FIO document.
    pub document: Value,
    /// Caller overrides.
    pub overrides: IngestOverrides,
    /// Ingestion time.
    pub now: Timestamp,
    /// Authorized caller, for audit logging.
    pub actor: Option<CallerIdentity>,
}

/// One item of a bulk ingestion.
#[derive(Debug, Clone)]
pub struct BulkIngestItem {
    /// Source file name.
    pub source_name: String,
    /// Parsed document, or the reason it could not be read or parsed.
    pub document: Result<Value, String>,
}

/// Bulk ingestion request.
#[derive(Debug, Clone)]
pub struct BulkIngestRequest {
    /// Items in processing order.
    pub items: Vec<BulkIngestItem>,
    /// Overrides applied to every item.
    pub overrides: IngestOverrides,
    /// Re-ingest items already present in history.
    pub overwrite: bool,
    /// Extract and preview without writing.
    pub dry_run: bool,
    /// Ingestion time.
    pub now: Timestamp,
    /// Authorized caller, for audit logging.
    pub actor: Option<CallerIdentity>,
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Per-item bulk failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemError {
    /// Source file name.
    pub source: String,
    /// Failure description.
    pub message: String,
}

/// Dry-run preview of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestPreview {
    /// Source file name.
    pub source: String,
    /// Derived configuration identity.
    pub config_identity: ConfigIdentity,
    /// Derived run identity.
    pub run_identity: RunIdentity,
    /// Configuration tuple after overrides.
    pub tuple: ConfigTuple,
    /// Test date used for the run identity.
    pub test_date: String,
    /// FIO job name.
    pub test_name: String,
    /// Extracted metrics.
    pub metrics: RunMetrics,
    /// Whether a real run would skip this item as a duplicate.
    pub would_skip: bool,
}

/// Bulk ingestion result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIngestReport {
    /// Items submitted.
    pub total: u64,
    /// Items extracted successfully.
    pub processed: u64,
    /// Items written.
    pub imported: u64,
    /// Items skipped as duplicates (or that would be, in a dry run).
    pub skipped: u64,
    /// Per-item failures.
    pub errors: Vec<BulkItemError>,
    /// Dry-run previews; present only for dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previews: Option<Vec<IngestPreview>>,
}

// ============================================================================
// SECTION: Ingestor
// ============================================================================

/// Ingestion pipeline over a run ledger store.
#[derive(Debug, Clone)]
pub struct RunIngestor<S> {
    /// Backing store.
    store: S,
    /// Maximum items per bulk request.
    max_batch_items: Option<usize>,
}

impl<S: RunLedgerStore> RunIngestor<S> {
    /// Creates an ingestor without a batch limit.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            max_batch_items: None,
        }
    }

    /// Limits the number of items per bulk request.
    #[must_use]
    pub const fn with_max_batch_items(mut self, max: usize) -> Self {
        self.max_batch_items = Some(max);
        self
    }

    /// Ingests one document and returns the new history id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MalformedInput`] or [`LedgerError::Validation`]
    /// for unusable input and [`LedgerError::Storage`] when materialization
    /// fails; a failed call writes nothing.
    pub fn ingest(&self, request: &IngestRequest) -> Result<RunRecordId, LedgerError> {
        let record =
            prepare(&request.source_name, &request.document, &request.overrides, request.now)?;
        match self.materialize(&request.source_name, &record, MaterializeMode::Always, request.actor.as_ref())? {
            MaterializeOutcome::Inserted(id) => Ok(id),
            MaterializeOutcome::Duplicate => Err(LedgerError::Storage {
                message: "store skipped an unconditional insert".to_string(),
                retryable: false,
            }),
        }
    }

    /// Ingests many documents, one transaction per item.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] when the request exceeds the batch
    /// limit or the overrides are invalid. Per-item failures are reported in
    /// [`BulkIngestReport::errors`] instead.
    pub fn bulk_ingest(&self, request: &BulkIngestRequest) -> Result<BulkIngestReport, LedgerError> {
        if let Some(max) = self.max_batch_items
            && request.items.len() > max
        {
            return Err(ValidationError::new("items", format!("batch exceeds {max} items")).into());
        }
        request.overrides.validate()?;

        let mut report = BulkIngestReport {
            total: request.items.len() as u64,
            previews: request.dry_run.then(Vec::new),
            ..BulkIngestReport::default()
        };
        let mode = if request.overwrite { MaterializeMode::Always } else { MaterializeMode::SkipDuplicate };
        // Sources a dry run has already counted as imported earlier in this batch.
        let mut previewed: BTreeSet<(ConfigTuple, SourceDigest)> = BTreeSet::new();

        for item in &request.items {
            let outcome = match &item.document {
                Ok(document) => prepare(&item.source_name, document, &request.overrides, request.now),
                Err(message) => Err(LedgerError::MalformedInput(message.clone())),
            };
            let record = match outcome {
                Ok(record) => record,
                Err(err) => {
                    warn!(target: "fio_ledger::ingest", source = %item.source_name, error = %err, "bulk item rejected");
                    report.errors.push(BulkItemError {
                        source: item.source_name.clone(),
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            report.processed += 1;

            if let Some(previews) = report.previews.as_mut() {
                let would_skip = if request.overwrite {
                    false
                } else {
                    let key = (record.tuple.clone(), record.metadata.source_digest.clone());
                    match self.store.contains_source(&record.tuple, &record.metadata.source_digest) {
                        Ok(found) => found || !previewed.insert(key),
                        Err(err) => {
                            report.errors.push(BulkItemError {
                                source: item.source_name.clone(),
                                message: err.to_string(),
                            });
                            continue;
                        }
                    }
                };
                if would_skip {
                    report.skipped += 1;
                }
                previews.push(IngestPreview {
                    source: item.source_name.clone(),
                    config_identity: record.config_identity,
                    run_identity: record.run_identity,
                    tuple: record.tuple,
                    test_date: record.metadata.test_date,
                    test_name: record.metadata.test_name,
                    metrics: record.metrics,
                    would_skip,
                });
                continue;
            }

            match self.materialize(&item.source_name, &record, mode, request.actor.as_ref()) {
                Ok(MaterializeOutcome::Inserted(_)) => report.imported += 1,
                Ok(MaterializeOutcome::Duplicate) => report.skipped += 1,
                Err(err) => report.errors.push(BulkItemError {
                    source: item.source_name.clone(),
                    message: err.to_string(),
                }),
            }
        }

        info!(
            target: "fio_ledger::ingest",
            total = report.total,
            processed = report.processed,
            imported = report.imported,
            skipped = report.skipped,
            errors = report.errors.len(),
            dry_run = request.dry_run,
            overwrite = request.overwrite,
            actor = %request.actor.as_ref().map_or_else(|| "anonymous".to_string(), ToString::to_string),
            "bulk ingestion finished"
        );
        Ok(report)
    }

    /// Materializes one record and logs the outcome.
    fn materialize(
        &self,
        source_name: &str,
        record: &NewRunRecord,
        mode: MaterializeMode,
        actor: Option<&CallerIdentity>,
    ) -> Result<MaterializeOutcome, LedgerError> {
        let tuple = record.tuple.summary();
        match self.store.materialize(record, mode) {
            Ok(MaterializeOutcome::Inserted(id)) => {
                info!(
                    target: "fio_ledger::ingest",
                    source = %source_name,
                    id = id.get(),
                    tuple = %tuple,
                    config_identity = %record.config_identity,
                    run_identity = %record.run_identity,
                    actor = %actor.map_or_else(|| "anonymous".to_string(), ToString::to_string),
                    "run ingested"
                );
                Ok(MaterializeOutcome::Inserted(id))
            }
            Ok(MaterializeOutcome::Duplicate) => {
                info!(target: "fio_ledger::ingest", source = %source_name, tuple = %tuple, "duplicate source skipped");
                Ok(MaterializeOutcome::Duplicate)
            }
            Err(err) => {
                error!(target: "fio_ledger::ingest", source = %source_name, tuple = %tuple, error = %err, "materialization failed");
                Err(err.into())
            }
        }
    }
}

// ============================================================================
// SECTION: Record Preparation
// ============================================================================

/// Builds a storable record from a document, overrides, and ingestion time.
fn prepare(
    source_name: &str,
    document: &Value,
    overrides: &IngestOverrides,
    now: Timestamp,
) -> Result<NewRunRecord, LedgerError> {
    overrides.validate()?;
    let extracted = extract_run(document)?;
    let digest = source_digest(document)?;

    let mut tuple = extracted.tuple;
    overrides.apply(&mut tuple);

    let test_date = match non_blank(overrides.test_date.as_deref()) {
        Some(date) => date.to_string(),
        None => extracted.document_timestamp.unwrap_or(now).to_rfc3339(),
    };
    let config_identity = config_identity(&tuple.hostname);
    let run_identity = run_identity(&tuple.hostname, &test_date)?;
    let description = non_blank(overrides.description.as_deref())
        .map_or_else(|| format!("Imported from {source_name}"), str::to_string);

    Ok(NewRunRecord {
        config_identity,
        run_identity,
        tuple,
        metrics: extracted.metrics,
        metadata: RunMetadata {
            timestamp: now,
            test_date,
            test_name: extracted.test_name,
            description,
            source_file: source_name.to_string(),
            source_digest: digest,
            output_file: extracted.output_file,
            fio_version: extracted.fio_version,
            job_runtime_ms: extracted.job_runtime_ms,
            rwmixread: extracted.rwmixread,
        },
    })
}

/// Returns the trimmed value unless it is blank.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
