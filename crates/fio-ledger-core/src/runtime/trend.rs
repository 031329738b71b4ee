// crates/fio-ledger-core/src/runtime/trend.rs
// ============================================================================
// Module: fio-ledger Trend Analyzer
// Description: Period-over-period change, summary stats, and metric readings.
// Purpose: Turn a host's historical metric series into a trend report.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! [`analyze_trend`] is a pure function over samples selected from history.
//! Points are ordered by timestamp, then id. Each point after the first
//! carries the percent change from its predecessor; from the third point on a
//! trailing three-point moving average is attached. Percent changes against a
//! zero predecessor render as `"N/A"` and never produce `NaN`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;

use crate::core::error::ValidationError;
use crate::core::filter::DateRange;
use crate::core::identifiers::RunRecordId;
use crate::core::record::RunRecord;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum lookback window in days.
pub const MAX_TREND_DAYS: u32 = 365;
/// Moving-average window size.
const MOVING_AVERAGE_WINDOW: usize = 3;
/// Message returned when the window holds no samples.
pub const NO_DATA_MESSAGE: &str = "No data found for the specified period";

// ============================================================================
// SECTION: Metrics
// ============================================================================

/// Metric a trend is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    /// Combined IOPS.
    Iops,
    /// Weighted average latency.
    AvgLatency,
    /// Combined bandwidth.
    Bandwidth,
    /// P95 completion latency.
    P95Latency,
    /// P99 completion latency.
    P99Latency,
}

impl TrendMetric {
    /// Returns the canonical metric name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Iops => "iops",
            Self::AvgLatency => "avg_latency",
            Self::Bandwidth => "bandwidth",
            Self::P95Latency => "p95_latency",
            Self::P99Latency => "p99_latency",
        }
    }

    /// Returns the display unit.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Iops => "IOPS",
            Self::AvgLatency | Self::P95Latency | Self::P99Latency => "ms",
            Self::Bandwidth => "MB/s",
        }
    }

    /// Reads the metric from a record, if recorded.
    #[must_use]
    pub fn value_of(self, record: &RunRecord) -> Option<f64> {
        let metrics = &record.metrics;
        let value = match self {
            Self::Iops => Some(metrics.iops),
            Self::AvgLatency => Some(metrics.avg_latency_ms),
            Self::Bandwidth => Some(metrics.bandwidth_mbps),
            Self::P95Latency => metrics.percentiles.p95(),
            Self::P99Latency => metrics.percentiles.p99(),
        };
        value.filter(|value| value.is_finite())
    }
}

impl fmt::Display for TrendMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrendMetric {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "iops" => Ok(Self::Iops),
            "avg_latency" | "latency" => Ok(Self::AvgLatency),
            "bandwidth" => Ok(Self::Bandwidth),
            "p95_latency" => Ok(Self::P95Latency),
            "p99_latency" => Ok(Self::P99Latency),
            other => Err(ValidationError::new("metric", format!("unsupported metric '{other}'"))),
        }
    }
}

/// One metric value with its display unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricReading {
    /// Recorded value.
    pub value: f64,
    /// Display unit of the value.
    pub unit: &'static str,
}

/// Selected metrics of one stored run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceData {
    /// History row id.
    pub id: RunRecordId,
    /// Readings keyed by metric name.
    pub metrics: BTreeMap<&'static str, MetricReading>,
}

/// Projects the selected metrics out of each record.
///
/// Metrics a record did not capture are left out of its map.
#[must_use]
pub fn performance_data(records: &[RunRecord], metrics: &[TrendMetric]) -> Vec<PerformanceData> {
    records
        .iter()
        .map(|record| PerformanceData {
            id: record.id,
            metrics: metrics
                .iter()
                .filter_map(|metric| {
                    metric.value_of(record).map(|value| {
                        (metric.name(), MetricReading {
                            value,
                            unit: metric.unit(),
                        })
                    })
                })
                .collect(),
        })
        .collect()
}

// ============================================================================
// SECTION: Query
// ============================================================================

/// Time window of a trend query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendWindow {
    /// Lookback of whole days ending at "now".
    Days(u32),
    /// Explicit range.
    Range(DateRange),
}

impl TrendWindow {
    /// Creates a validated lookback window.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when `days` is outside `1..=365`.
    pub fn days(days: u32) -> Result<Self, ValidationError> {
        if days == 0 || days > MAX_TREND_DAYS {
            return Err(ValidationError::new("days", format!("must be between 1 and {MAX_TREND_DAYS}")));
        }
        Ok(Self::Days(days))
    }

    /// Resolves the window to a date range relative to `now`.
    #[must_use]
    pub const fn resolve(self, now: Timestamp) -> DateRange {
        match self {
            Self::Days(days) => DateRange {
                start: Some(now.minus_days(days)),
                end: Some(now),
            },
            Self::Range(range) => range,
        }
    }
}

/// Trend request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendQuery {
    /// Host whose history is analyzed.
    pub hostname: String,
    /// Metric analyzed.
    pub metric: TrendMetric,
    /// Time window.
    pub window: TrendWindow,
}

impl TrendQuery {
    /// Creates a validated query.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the hostname is blank.
    pub fn new(
        hostname: impl Into<String>,
        metric: TrendMetric,
        window: TrendWindow,
    ) -> Result<Self, ValidationError> {
        let hostname = hostname.into();
        if hostname.trim().is_empty() {
            return Err(ValidationError::new("hostname", "must not be empty"));
        }
        Ok(Self {
            hostname,
            metric,
            window,
        })
    }
}

// ============================================================================
// SECTION: Samples and Points
// ============================================================================

/// One historical observation of the queried metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSample {
    /// History row id.
    pub id: RunRecordId,
    /// Ingestion time.
    pub timestamp: Timestamp,
    /// Block size.
    pub block_size: String,
    /// Read/write pattern.
    pub read_write_pattern: String,
    /// Queue depth.
    pub queue_depth: u32,
    /// Metric value.
    pub value: f64,
}

impl TrendSample {
    /// Builds a sample from a record; `None` when the metric is absent.
    #[must_use]
    pub fn from_record(record: &RunRecord, metric: TrendMetric) -> Option<Self> {
        Some(Self {
            id: record.id,
            timestamp: record.metadata.timestamp,
            block_size: record.tuple.block_size.clone(),
            read_write_pattern: record.tuple.read_write_pattern.clone(),
            queue_depth: record.tuple.queue_depth,
            value: metric.value_of(record)?,
        })
    }
}

/// Relative change between two values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PercentChange {
    /// Change in percent.
    Percent(f64),
    /// Change against a zero base.
    Undefined,
}

impl PercentChange {
    /// Computes the change from `base` to `value`.
    #[must_use]
    pub fn between(base: f64, value: f64) -> Self {
        if base == 0.0 {
            return Self::Undefined;
        }
        let change = (value - base) / base * 100.0;
        if change.is_finite() { Self::Percent(change) } else { Self::Undefined }
    }
}

impl fmt::Display for PercentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(value) => write!(f, "{value:+.2}%"),
            Self::Undefined => f.write_str("N/A"),
        }
    }
}

impl Serialize for PercentChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One point of the trend series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// History row id.
    pub id: RunRecordId,
    /// Ingestion time.
    pub timestamp: Timestamp,
    /// Block size.
    pub block_size: String,
    /// Read/write pattern.
    pub read_write_pattern: String,
    /// Queue depth.
    pub queue_depth: u32,
    /// Metric value.
    pub value: f64,
    /// Unit of `value`.
    pub unit: &'static str,
    /// Trailing three-point mean; absent for the first two points.
    pub moving_avg: Option<f64>,
    /// Change from the previous point; absent for the first point.
    pub percent_change: Option<PercentChange>,
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Summary statistics over the whole series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    /// Number of points.
    pub total_points: usize,
    /// Minimum value.
    #[serde(rename = "min_value")]
    pub min: f64,
    /// Maximum value.
    #[serde(rename = "max_value")]
    pub max: f64,
    /// Arithmetic mean.
    #[serde(rename = "avg_value")]
    pub mean: f64,
    /// First value.
    #[serde(rename = "first_value")]
    pub first: f64,
    /// Last value.
    #[serde(rename = "last_value")]
    pub last: f64,
    /// Change from first to last.
    pub overall_change: PercentChange,
}

/// Trend analysis outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TrendAnalysis {
    /// The window holds no samples.
    NoData {
        /// Explanation.
        message: String,
    },
    /// Summary over at least one sample.
    Summary(TrendSummary),
}

/// Trend report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    /// Analyzed host.
    pub hostname: String,
    /// Analyzed metric.
    pub metric: TrendMetric,
    /// Unit of every value.
    pub unit: &'static str,
    /// Ordered points.
    #[serde(rename = "data")]
    pub points: Vec<TrendPoint>,
    /// Summary or no-data marker.
    #[serde(rename = "trend_analysis")]
    pub analysis: TrendAnalysis,
}

// ============================================================================
// SECTION: Analysis
// ============================================================================

/// Computes the trend report for the query over the given samples.
///
/// Samples are ordered by timestamp, then id, before analysis.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "Series lengths stay far below 2^52.")]
pub fn analyze_trend(query: &TrendQuery, mut samples: Vec<TrendSample>) -> TrendReport {
    samples.retain(|sample| sample.value.is_finite());
    samples.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
    let unit = query.metric.unit();

    let values: Vec<f64> = samples.iter().map(|sample| sample.value).collect();
    let points = samples
        .into_iter()
        .enumerate()
        .map(|(index, sample)| {
            let percent_change = index.checked_sub(1).map(|prev| PercentChange::between(values[prev], sample.value));
            let moving_avg = (index + 1 >= MOVING_AVERAGE_WINDOW).then(|| {
                let window = &values[index + 1 - MOVING_AVERAGE_WINDOW ..= index];
                window.iter().sum::<f64>() / MOVING_AVERAGE_WINDOW as f64
            });
            TrendPoint {
                id: sample.id,
                timestamp: sample.timestamp,
                block_size: sample.block_size,
                read_write_pattern: sample.read_write_pattern,
                queue_depth: sample.queue_depth,
                value: sample.value,
                unit,
                moving_avg,
                percent_change,
            }
        })
        .collect();

    let analysis = match (values.first(), values.last()) {
        (Some(&first), Some(&last)) => TrendAnalysis::Summary(TrendSummary {
            total_points: values.len(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean: values.iter().sum::<f64>() / values.len() as f64,
            first,
            last,
            overall_change: PercentChange::between(first, last),
        }),
        _ => TrendAnalysis::NoData {
            message: NO_DATA_MESSAGE.to_string(),
        },
    };

    TrendReport {
        hostname: query.hostname.clone(),
        metric: query.metric,
        unit,
        points,
        analysis,
    }
}
