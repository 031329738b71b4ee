// crates/fio-ledger-core/src/core/extract.rs
// ============================================================================
// Module: fio-ledger Metric Extractor
// Description: Normalizes FIO JSON result documents into run fields.
// Purpose: Turn one parsed FIO document into a tuple, metrics, and metadata.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Only the first entry of the `jobs` array is read; further jobs are ignored.
//! Option values resolve from the job's own options (`job options`, or
//! `job_options`), then the document's `global options`, then a fixed
//! default.
//!
//! Metric policy:
//! - IOPS is read IOPS plus write IOPS.
//! - Average latency is the I/O-count-weighted mean of the read and write mean
//!   latencies, converted from nanoseconds to milliseconds (0 without I/O).
//! - Each percentile is the maximum of the read and write value, in ms.
//! - Bandwidth is read plus write bytes/s divided by 1024 * 1024.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::record::ConfigTuple;
use crate::core::record::LatencyPercentiles;
use crate::core::record::PERCENTILE_LEVELS;
use crate::core::record::RunMetrics;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default block size.
pub const DEFAULT_BLOCK_SIZE: &str = "4K";
/// Default read/write pattern.
pub const DEFAULT_PATTERN: &str = "read";
/// Default test size placeholder.
pub const DEFAULT_TEST_SIZE: &str = "1M";
/// Default output file name.
pub const DEFAULT_OUTPUT_FILE: &str = "testfile";
/// Default hostname when neither the document nor overrides supply one.
pub const DEFAULT_HOSTNAME: &str = "unknown";
/// Default protocol label.
pub const DEFAULT_PROTOCOL: &str = "Local";
/// Default drive type and drive model label.
pub const DEFAULT_DRIVE_LABEL: &str = "Unknown";
/// Default job name.
pub const DEFAULT_TEST_NAME: &str = "unknown";

/// Nanoseconds per millisecond.
const NANOS_PER_MILLI: f64 = 1_000_000.0;
/// Bytes per MiB.
const BYTES_PER_MIB: f64 = 1_048_576.0;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Extraction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The document lacks required structure or carries unusable values.
    #[error("malformed fio document: {0}")]
    MalformedInput(String),
}

// ============================================================================
// SECTION: Extracted Run
// ============================================================================

/// Fields extracted from one FIO document before identities are derived.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRun {
    /// Configuration tuple with default labels for host and drive.
    pub tuple: ConfigTuple,
    /// Measured metrics.
    pub metrics: RunMetrics,
    /// FIO job name.
    pub test_name: String,
    /// FIO `filename` option.
    pub output_file: String,
    /// FIO version, if reported.
    pub fio_version: Option<String>,
    /// Job runtime in milliseconds, if reported.
    pub job_runtime_ms: Option<u64>,
    /// Read percentage for mixed workloads, if configured.
    pub rwmixread: Option<u32>,
    /// Document `timestamp`, if reported.
    pub document_timestamp: Option<Timestamp>,
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Extracts a run from a parsed FIO result document.
///
/// # Errors
///
/// Returns [`ExtractError::MalformedInput`] when the document is not an
/// object, has no non-empty `jobs` array, or carries a numeric option that
/// cannot be parsed.
pub fn extract_run(document: &Value) -> Result<ExtractedRun, ExtractError> {
    let root = document
        .as_object()
        .ok_or_else(|| ExtractError::MalformedInput("document is not a json object".to_string()))?;
    let job = root
        .get("jobs")
        .and_then(Value::as_array)
        .and_then(|jobs| jobs.first())
        .ok_or_else(|| ExtractError::MalformedInput("no jobs found in fio data".to_string()))?
        .as_object()
        .ok_or_else(|| ExtractError::MalformedInput("first job is not an object".to_string()))?;

    let options = JobOptions::new(root, job);
    let queue_depth = options.unsigned("iodepth", 1)?;
    let tuple = ConfigTuple {
        hostname: DEFAULT_HOSTNAME.to_string(),
        protocol: DEFAULT_PROTOCOL.to_string(),
        drive_type: DEFAULT_DRIVE_LABEL.to_string(),
        drive_model: DEFAULT_DRIVE_LABEL.to_string(),
        block_size: options.text("bs", DEFAULT_BLOCK_SIZE).to_uppercase(),
        read_write_pattern: options.text("rw", DEFAULT_PATTERN),
        queue_depth,
        num_jobs: options.unsigned("numjobs", 1)?,
        direct: options.flag("direct")?,
        sync: options.flag("sync")?,
        test_size: options.text("size", DEFAULT_TEST_SIZE),
        iodepth: queue_depth,
        duration_secs: duration_secs(&options, job)?,
    };

    let read = job.get("read").and_then(Value::as_object);
    let write = job.get("write").and_then(Value::as_object);
    let metrics = RunMetrics {
        iops: side_number(read, &["iops"]) + side_number(write, &["iops"]),
        avg_latency_ms: weighted_latency_ms(read, write),
        bandwidth_mbps: (side_number(read, &["bw_bytes"]) + side_number(write, &["bw_bytes"]))
            / BYTES_PER_MIB,
        percentiles: percentiles(read, write),
        total_ios_read: side_count(read),
        total_ios_write: side_count(write),
        usr_cpu: job.get("usr_cpu").or_else(|| root.get("usr_cpu")).and_then(Value::as_f64),
        sys_cpu: job.get("sys_cpu").or_else(|| root.get("sys_cpu")).and_then(Value::as_f64),
    };

    let rwmixread = match options.get("rwmixread") {
        Some(_) => Some(options.unsigned("rwmixread", 0)?),
        None => None,
    };

    Ok(ExtractedRun {
        tuple,
        metrics,
        test_name: job
            .get("jobname")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TEST_NAME)
            .to_string(),
        output_file: options.text("filename", DEFAULT_OUTPUT_FILE),
        fio_version: root
            .get("fio version")
            .or_else(|| root.get("fio_version"))
            .and_then(Value::as_str)
            .map(str::to_string),
        job_runtime_ms: job.get("job_runtime").and_then(Value::as_u64),
        rwmixread,
        document_timestamp: root.get("timestamp").and_then(Value::as_i64).map(Timestamp::from_unix_seconds),
    })
}

// ============================================================================
// SECTION: Option Resolution
// ============================================================================

/// Layered view over job-local and global options.
struct JobOptions<'a> {
    /// Job-local options.
    local: Option<&'a Map<String, Value>>,
    /// Document-global options.
    global: Option<&'a Map<String, Value>>,
}

impl<'a> JobOptions<'a> {
    /// Builds the view for the first job of a document.
    fn new(root: &'a Map<String, Value>, job: &'a Map<String, Value>) -> Self {
        Self {
            local: job
                .get("job options")
                .or_else(|| job.get("job_options"))
                .and_then(Value::as_object),
            global: root.get("global options").and_then(Value::as_object),
        }
    }

    /// Returns the raw option value, job-local first.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.local
            .and_then(|options| options.get(key))
            .or_else(|| self.global.and_then(|options| options.get(key)))
    }

    /// Returns a textual option, rendering numbers as text.
    fn text(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(Value::String(value)) if !value.trim().is_empty() => value.trim().to_string(),
            Some(Value::Number(value)) => value.to_string(),
            _ => default.to_string(),
        }
    }

    /// Returns an unsigned numeric option.
    fn unsigned(&self, key: &str, default: u32) -> Result<u32, ExtractError> {
        self.get(key).map_or(Ok(default), |value| parse_unsigned(key, value))
    }

    /// Returns a 0/1 flag option.
    fn flag(&self, key: &str) -> Result<bool, ExtractError> {
        match self.get(key) {
            Some(Value::Bool(value)) => Ok(*value),
            Some(value) => Ok(parse_unsigned(key, value)? != 0),
            None => Ok(false),
        }
    }
}

/// Parses a JSON number or numeric string as `u32`.
fn parse_unsigned(key: &str, value: &Value) -> Result<u32, ExtractError> {
    let parsed = match value {
        Value::Number(number) => number.as_u64().and_then(|raw| u32::try_from(raw).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ExtractError::MalformedInput(format!("option {key} is not an unsigned integer")))
}

/// Resolves the test duration in seconds.
fn duration_secs(options: &JobOptions<'_>, job: &Map<String, Value>) -> Result<u32, ExtractError> {
    if let Some(value) = options.get("runtime") {
        let parsed = match value {
            Value::String(text) => {
                let trimmed = text.trim();
                trimmed.strip_suffix('s').unwrap_or(trimmed).trim().parse::<u32>().ok()
            }
            Value::Number(number) => number.as_u64().and_then(|raw| u32::try_from(raw).ok()),
            _ => None,
        };
        return parsed
            .ok_or_else(|| ExtractError::MalformedInput("option runtime is not a duration".to_string()));
    }
    let runtime_ms = job.get("job_runtime").and_then(Value::as_u64).unwrap_or(0);
    Ok(u32::try_from(runtime_ms / 1_000).unwrap_or(u32::MAX))
}

// ============================================================================
// SECTION: Metric Helpers
// ============================================================================

/// Reads a nested numeric field from one side, defaulting to zero.
fn side_number(side: Option<&Map<String, Value>>, path: &[&str]) -> f64 {
    nested(side, path).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Walks a nested object path.
fn nested<'a>(side: Option<&'a Map<String, Value>>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = side?.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// Returns the operation count of one side (`io_ops`, else `total_ios`).
fn side_count(side: Option<&Map<String, Value>>) -> u64 {
    nested(side, &["io_ops"])
        .or_else(|| nested(side, &["total_ios"]))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Computes the I/O-count-weighted mean latency in milliseconds.
#[allow(clippy::cast_precision_loss, reason = "Operation counts stay far below 2^52.")]
fn weighted_latency_ms(read: Option<&Map<String, Value>>, write: Option<&Map<String, Value>>) -> f64 {
    let read_ios = side_count(read) as f64;
    let write_ios = side_count(write) as f64;
    let total = read_ios + write_ios;
    if total <= 0.0 {
        return 0.0;
    }
    let read_lat = side_number(read, &["lat_ns", "mean"]);
    let write_lat = side_number(write, &["lat_ns", "mean"]);
    (read_lat * read_ios + write_lat * write_ios) / total / NANOS_PER_MILLI
}

/// Collects each percentile as the max of read and write, in milliseconds.
fn percentiles(read: Option<&Map<String, Value>>, write: Option<&Map<String, Value>>) -> LatencyPercentiles {
    let mut out = LatencyPercentiles::new();
    for level in PERCENTILE_LEVELS {
        let path = ["clat_ns", "percentile", level.fio_key()];
        let read_value = nested(read, &path).and_then(Value::as_f64);
        let write_value = nested(write, &path).and_then(Value::as_f64);
        let value = match (read_value, write_value) {
            (Some(r), Some(w)) => Some(r.max(w)),
            (Some(v), None) | (None, Some(v)) => Some(v),
            (None, None) => None,
        };
        if let Some(value) = value {
            out.set(level, value / NANOS_PER_MILLI);
        }
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
