// crates/fio-ledger-core/src/core/record.rs
// ============================================================================
// Module: fio-ledger Run Records
// Description: Run records, configuration tuples, metrics, and listing summaries.
// Purpose: Define the canonical shape of one ingested benchmark execution.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`RunRecord`] is one benchmark execution. Its [`ConfigTuple`] defines
//! "the same benchmark setup": the latest-state view keeps exactly one row per
//! distinct tuple. Metrics are stored in milliseconds (latency), operations per
//! second (IOPS), and MiB per second (bandwidth).
//!
//! # Invariants
//! - Tuple dimensions are immutable in history except the descriptive labels
//!   (hostname, protocol, drive type, drive model), which are edited in both
//!   stores together.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ConfigIdentity;
use crate::core::identifiers::RunIdentity;
use crate::core::identifiers::RunRecordId;
use crate::core::identity::SourceDigest;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Configuration Tuple
// ============================================================================

/// Workload and hardware dimensions identifying one benchmark setup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigTuple {
    /// Host the benchmark ran on.
    pub hostname: String,
    /// Access protocol label (for example `Local`, `NFS`, `iSCSI`).
    pub protocol: String,
    /// Drive type label.
    pub drive_type: String,
    /// Drive model label.
    pub drive_model: String,
    /// Upper-cased block size (for example `4K`).
    pub block_size: String,
    /// FIO `rw` pattern.
    pub read_write_pattern: String,
    /// Queue depth.
    pub queue_depth: u32,
    /// Number of FIO jobs.
    pub num_jobs: u32,
    /// Direct I/O flag.
    pub direct: bool,
    /// Sync flag.
    pub sync: bool,
    /// Test file size.
    pub test_size: String,
    /// FIO `iodepth` option.
    pub iodepth: u32,
    /// Test duration in seconds.
    pub duration_secs: u32,
}

impl ConfigTuple {
    /// Returns the total outstanding I/O (`queue_depth * num_jobs`).
    #[must_use]
    pub const fn total_outstanding(&self) -> u64 {
        (self.queue_depth as u64) * (self.num_jobs as u64)
    }

    /// Short human-readable summary used in log fields.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}/{}/{}/{} bs={} rw={} qd={} jobs={}",
            self.hostname,
            self.protocol,
            self.drive_type,
            self.drive_model,
            self.block_size,
            self.read_write_pattern,
            self.queue_depth,
            self.num_jobs
        )
    }
}

// ============================================================================
// SECTION: Latency Percentiles
// ============================================================================

/// Completion-latency percentile levels recorded per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PercentileLevel {
    /// 1st percentile.
    #[serde(rename = "p1")]
    P1,
    /// 5th percentile.
    #[serde(rename = "p5")]
    P5,
    /// 10th percentile.
    #[serde(rename = "p10")]
    P10,
    /// 20th percentile.
    #[serde(rename = "p20")]
    P20,
    /// 30th percentile.
    #[serde(rename = "p30")]
    P30,
    /// 40th percentile.
    #[serde(rename = "p40")]
    P40,
    /// Median.
    #[serde(rename = "p50")]
    P50,
    /// 60th percentile.
    #[serde(rename = "p60")]
    P60,
    /// 70th percentile.
    #[serde(rename = "p70")]
    P70,
    /// 80th percentile.
    #[serde(rename = "p80")]
    P80,
    /// 90th percentile.
    #[serde(rename = "p90")]
    P90,
    /// 95th percentile.
    #[serde(rename = "p95")]
    P95,
    /// 99th percentile.
    #[serde(rename = "p99")]
    P99,
    /// 99.5th percentile.
    #[serde(rename = "p99_5")]
    P99_5,
    /// 99.9th percentile.
    #[serde(rename = "p99_9")]
    P99_9,
    /// 99.95th percentile.
    #[serde(rename = "p99_95")]
    P99_95,
    /// 99.99th percentile.
    #[serde(rename = "p99_99")]
    P99_99,
}

/// All recorded percentile levels in ascending order.
pub const PERCENTILE_LEVELS: [PercentileLevel; 17] = [
    PercentileLevel::P1,
    PercentileLevel::P5,
    PercentileLevel::P10,
    PercentileLevel::P20,
    PercentileLevel::P30,
    PercentileLevel::P40,
    PercentileLevel::P50,
    PercentileLevel::P60,
    PercentileLevel::P70,
    PercentileLevel::P80,
    PercentileLevel::P90,
    PercentileLevel::P95,
    PercentileLevel::P99,
    PercentileLevel::P99_5,
    PercentileLevel::P99_9,
    PercentileLevel::P99_95,
    PercentileLevel::P99_99,
];

impl PercentileLevel {
    /// Returns the key FIO uses in `clat_ns.percentile`.
    #[must_use]
    pub const fn fio_key(self) -> &'static str {
        match self {
            Self::P1 => "1.000000",
            Self::P5 => "5.000000",
            Self::P10 => "10.000000",
            Self::P20 => "20.000000",
            Self::P30 => "30.000000",
            Self::P40 => "40.000000",
            Self::P50 => "50.000000",
            Self::P60 => "60.000000",
            Self::P70 => "70.000000",
            Self::P80 => "80.000000",
            Self::P90 => "90.000000",
            Self::P95 => "95.000000",
            Self::P99 => "99.000000",
            Self::P99_5 => "99.500000",
            Self::P99_9 => "99.900000",
            Self::P99_95 => "99.950000",
            Self::P99_99 => "99.990000",
        }
    }
}

/// Percentile latencies in milliseconds, keyed by level.
///
/// Levels absent on both the read and write side are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LatencyPercentiles(BTreeMap<PercentileLevel, f64>);

impl LatencyPercentiles {
    /// Creates an empty percentile set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the latency at a level, if recorded.
    #[must_use]
    pub fn get(&self, level: PercentileLevel) -> Option<f64> {
        self.0.get(&level).copied()
    }

    /// Records the latency at a level.
    pub fn set(&mut self, level: PercentileLevel, value_ms: f64) {
        self.0.insert(level, value_ms);
    }

    /// Returns the P95 latency, if recorded.
    #[must_use]
    pub fn p95(&self) -> Option<f64> {
        self.get(PercentileLevel::P95)
    }

    /// Returns the P99 latency, if recorded.
    #[must_use]
    pub fn p99(&self) -> Option<f64> {
        self.get(PercentileLevel::P99)
    }

    /// Returns `true` when no percentile is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// SECTION: Metrics and Metadata
// ============================================================================

/// Measured metrics of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Combined read and write IOPS.
    pub iops: f64,
    /// I/O-count-weighted mean latency in milliseconds.
    pub avg_latency_ms: f64,
    /// Combined bandwidth in MiB per second.
    pub bandwidth_mbps: f64,
    /// Completion-latency percentiles in milliseconds.
    pub percentiles: LatencyPercentiles,
    /// Read operation count.
    pub total_ios_read: u64,
    /// Write operation count.
    pub total_ios_write: u64,
    /// User CPU percentage.
    pub usr_cpu: Option<f64>,
    /// System CPU percentage.
    pub sys_cpu: Option<f64>,
}

/// Descriptive metadata of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Ingestion time.
    pub timestamp: Timestamp,
    /// Test date as supplied or derived (RFC 3339 or `YYYY-MM-DD`).
    pub test_date: String,
    /// FIO job name.
    pub test_name: String,
    /// Free-text description.
    pub description: String,
    /// Source file name.
    pub source_file: String,
    /// Digest of the canonical source document.
    pub source_digest: SourceDigest,
    /// FIO `filename` option.
    pub output_file: String,
    /// FIO version string, if reported.
    pub fio_version: Option<String>,
    /// Job runtime in milliseconds, if reported.
    pub job_runtime_ms: Option<u64>,
    /// Read percentage for mixed workloads, if reported.
    pub rwmixread: Option<u32>,
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// A run record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRunRecord {
    /// Configuration identity.
    pub config_identity: ConfigIdentity,
    /// Run identity.
    pub run_identity: RunIdentity,
    /// Configuration tuple.
    pub tuple: ConfigTuple,
    /// Measured metrics.
    pub metrics: RunMetrics,
    /// Descriptive metadata.
    pub metadata: RunMetadata,
}

impl NewRunRecord {
    /// Attaches a store-assigned identifier.
    #[must_use]
    pub fn with_id(self, id: RunRecordId) -> RunRecord {
        RunRecord {
            id,
            config_identity: self.config_identity,
            run_identity: self.run_identity,
            tuple: self.tuple,
            metrics: self.metrics,
            metadata: self.metadata,
        }
    }
}

/// A stored run record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Store-assigned identifier.
    pub id: RunRecordId,
    /// Configuration identity.
    pub config_identity: ConfigIdentity,
    /// Run identity.
    pub run_identity: RunIdentity,
    /// Configuration tuple.
    pub tuple: ConfigTuple,
    /// Measured metrics.
    pub metrics: RunMetrics,
    /// Descriptive metadata.
    pub metadata: RunMetadata,
}

// ============================================================================
// SECTION: Listing Summaries
// ============================================================================

/// Distinct values present in the latest-state view, per filterable field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Distinct hostnames.
    pub hostnames: Vec<String>,
    /// Distinct protocols.
    pub protocols: Vec<String>,
    /// Distinct drive types.
    pub drive_types: Vec<String>,
    /// Distinct drive models.
    pub drive_models: Vec<String>,
    /// Distinct `hostname - protocol - drive_model` combinations.
    pub host_disk_combinations: Vec<String>,
    /// Distinct block sizes.
    pub block_sizes: Vec<String>,
    /// Distinct read/write patterns.
    pub patterns: Vec<String>,
    /// Distinct queue depths.
    pub queue_depths: Vec<u32>,
    /// Distinct job counts.
    pub num_jobs: Vec<u32>,
    /// Distinct direct flags.
    pub directs: Vec<bool>,
    /// Distinct sync flags.
    pub syncs: Vec<bool>,
    /// Distinct test sizes.
    pub test_sizes: Vec<String>,
    /// Distinct durations in seconds.
    pub durations: Vec<u32>,
}

/// Per-server aggregate over the latest-state view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSummary {
    /// Hostname.
    pub hostname: String,
    /// Protocol.
    pub protocol: String,
    /// Drive model.
    pub drive_model: String,
    /// Number of latest-state rows.
    pub test_count: u64,
    /// Oldest row timestamp.
    pub first_test: Timestamp,
    /// Newest row timestamp.
    pub last_test: Timestamp,
}
