// crates/fio-ledger-core/src/runtime/saturation.rs
// ============================================================================
// Module: fio-ledger Saturation Analyzer
// Description: Sweet-spot and saturation-point detection over concurrency sweeps.
// Purpose: Find where latency crosses an SLA as outstanding I/O grows.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! Runs sharing a run identity form one sweep. Each run becomes a step keyed
//! by total outstanding I/O (`queue_depth * num_jobs`); steps are grouped by
//! read/write pattern and walked in increasing concurrency:
//!
//! - A step whose P95 latency is at or under the threshold becomes the sweet
//!   spot (the last such step wins).
//! - The first step above the threshold is the saturation point and ends the
//!   walk for that pattern.
//! - Steps without a usable P95 (missing, `NaN`, negative) are skipped.
//!
//! Every step is kept in the output for charting. Equal concurrency is
//! ordered by record id.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ValidationError;
use crate::core::identifiers::RunIdentity;
use crate::core::identifiers::RunRecordId;
use crate::core::record::RunRecord;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One concurrency step of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaturationStep {
    /// History row id.
    pub id: RunRecordId,
    /// `queue_depth * num_jobs`.
    pub total_outstanding: u64,
    /// Queue depth.
    pub queue_depth: u32,
    /// Job count.
    pub num_jobs: u32,
    /// Block size.
    pub block_size: String,
    /// Combined IOPS.
    pub iops: f64,
    /// Weighted average latency in ms.
    pub avg_latency_ms: f64,
    /// Combined bandwidth in MiB/s.
    pub bandwidth_mbps: f64,
    /// P95 latency in ms.
    pub p95_latency_ms: Option<f64>,
    /// P99 latency in ms.
    pub p99_latency_ms: Option<f64>,
}

impl SaturationStep {
    /// Builds a step from a stored run.
    fn from_record(record: &RunRecord) -> Self {
        Self {
            id: record.id,
            total_outstanding: record.tuple.total_outstanding(),
            queue_depth: record.tuple.queue_depth,
            num_jobs: record.tuple.num_jobs,
            block_size: record.tuple.block_size.clone(),
            iops: record.metrics.iops,
            avg_latency_ms: record.metrics.avg_latency_ms,
            bandwidth_mbps: record.metrics.bandwidth_mbps,
            p95_latency_ms: record.metrics.percentiles.p95(),
            p99_latency_ms: record.metrics.percentiles.p99(),
        }
    }

    /// Returns the P95 latency when present, finite, and non-negative.
    fn usable_p95(&self) -> Option<f64> {
        self.p95_latency_ms.filter(|value| value.is_finite() && *value >= 0.0)
    }
}

/// Sweep result for one read/write pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSaturation {
    /// Steps in increasing concurrency order.
    pub steps: Vec<SaturationStep>,
    /// Last step at or under the threshold before saturation.
    pub sweet_spot: Option<SaturationStep>,
    /// First step above the threshold.
    pub saturation_point: Option<SaturationStep>,
}

/// Saturation analysis of one run identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaturationReport {
    /// Analyzed run identity.
    pub run_identity: RunIdentity,
    /// P95 latency SLA in ms.
    pub threshold_ms: f64,
    /// Results keyed by read/write pattern.
    pub patterns: BTreeMap<String, PatternSaturation>,
}

// ============================================================================
// SECTION: Analysis
// ============================================================================

/// Detects sweet spots and saturation points for one run identity.
///
/// Records with a different run identity are ignored.
///
/// # Errors
///
/// Returns [`ValidationError`] when the threshold is not a positive finite
/// number.
pub fn analyze_saturation(
    run_identity: &RunIdentity,
    runs: &[RunRecord],
    threshold_ms: f64,
) -> Result<SaturationReport, ValidationError> {
    if !threshold_ms.is_finite() || threshold_ms <= 0.0 {
        return Err(ValidationError::new("threshold_ms", "must be a positive number"));
    }

    let mut grouped: BTreeMap<String, Vec<SaturationStep>> = BTreeMap::new();
    for record in runs.iter().filter(|record| &record.run_identity == run_identity) {
        grouped
            .entry(record.tuple.read_write_pattern.clone())
            .or_default()
            .push(SaturationStep::from_record(record));
    }

    let patterns = grouped
        .into_iter()
        .map(|(pattern, mut steps)| {
            steps.sort_by_key(|step| (step.total_outstanding, step.id));
            (pattern, walk(steps, threshold_ms))
        })
        .collect();

    Ok(SaturationReport {
        run_identity: run_identity.clone(),
        threshold_ms,
        patterns,
    })
}

/// Walks ordered steps and marks the sweet spot and saturation point.
fn walk(steps: Vec<SaturationStep>, threshold_ms: f64) -> PatternSaturation {
    let mut sweet_spot = None;
    let mut saturation_point = None;
    for step in &steps {
        let Some(p95) = step.usable_p95() else {
            continue;
        };
        if p95 <= threshold_ms {
            sweet_spot = Some(step.clone());
        } else {
            saturation_point = Some(step.clone());
            break;
        }
    }
    PatternSaturation {
        steps,
        sweet_spot,
        saturation_point,
    }
}
