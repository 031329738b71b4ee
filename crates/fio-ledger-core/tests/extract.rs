// crates/fio-ledger-core/tests/extract.rs
// ============================================================================
// Module: Metric Extractor Tests
// Description: Validates metric policy, option resolution, and defaults.
// ============================================================================
//! ## Overview
//! Exercises [`extract_run`] against hand-built FIO documents.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use fio_ledger_core::ExtractError;
use fio_ledger_core::PercentileLevel;
use fio_ledger_core::extract_run;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}

// ============================================================================
// SECTION: Metric Policy
// ============================================================================

#[test]
fn mixed_job_combines_iops_and_weights_latency_by_io_count() {
    let doc = json!({
        "jobs": [{
            "jobname": "randrw_4k",
            "job options": {"rw": "randrw", "bs": "4k"},
            "read": {"iops": 1000.0, "io_ops": 100, "bw_bytes": 1_048_576, "lat_ns": {"mean": 200_000.0}},
            "write": {"iops": 500.0, "io_ops": 50, "bw_bytes": 2_097_152, "lat_ns": {"mean": 400_000.0}}
        }]
    });
    let run = extract_run(&doc).unwrap();
    assert_close(run.metrics.iops, 1500.0);
    assert_close(run.metrics.avg_latency_ms, 0.266_666_666_666_666_7);
    assert_close(run.metrics.bandwidth_mbps, 3.0);
    assert_eq!(run.metrics.total_ios_read, 100);
    assert_eq!(run.metrics.total_ios_write, 50);
    assert_eq!(run.test_name, "randrw_4k");
}

#[test]
fn percentiles_take_the_larger_side_in_milliseconds() {
    let doc = json!({
        "jobs": [{
            "read": {"clat_ns": {"percentile": {"95.000000": 3_000_000, "99.000000": 9_000_000}}},
            "write": {"clat_ns": {"percentile": {"95.000000": 5_000_000, "50.000000": 1_000_000}}}
        }]
    });
    let run = extract_run(&doc).unwrap();
    let percentiles = &run.metrics.percentiles;
    assert_eq!(percentiles.p95(), Some(5.0));
    assert_eq!(percentiles.p99(), Some(9.0));
    assert_eq!(percentiles.get(PercentileLevel::P50), Some(1.0));
    assert_eq!(percentiles.get(PercentileLevel::P99_99), None);
}

#[test]
fn no_io_yields_zero_average_latency() {
    let doc = json!({"jobs": [{"read": {"lat_ns": {"mean": 1_000_000.0}}}]});
    let run = extract_run(&doc).unwrap();
    assert_eq!(run.metrics.avg_latency_ms, 0.0);
    assert_eq!(run.metrics.iops, 0.0);
}

// ============================================================================
// SECTION: Options and Defaults
// ============================================================================

#[test]
fn missing_options_fall_back_to_defaults() {
    let run = extract_run(&json!({"jobs": [{}]})).unwrap();
    let tuple = &run.tuple;
    assert_eq!(tuple.block_size, "4K");
    assert_eq!(tuple.read_write_pattern, "read");
    assert_eq!(tuple.queue_depth, 1);
    assert_eq!(tuple.num_jobs, 1);
    assert_eq!(tuple.iodepth, 1);
    assert!(!tuple.direct);
    assert!(!tuple.sync);
    assert_eq!(tuple.test_size, "1M");
    assert_eq!(tuple.hostname, "unknown");
    assert_eq!(tuple.protocol, "Local");
    assert_eq!(tuple.drive_type, "Unknown");
    assert_eq!(tuple.drive_model, "Unknown");
    assert_eq!(run.output_file, "testfile");
}

#[test]
fn job_options_win_over_global_options() {
    let doc = json!({
        "fio version": "fio-3.36",
        "timestamp": 1_748_772_000,
        "global options": {"bs": "1m", "direct": "1", "size": "10G", "numjobs": 2},
        "jobs": [
            {"job options": {"bs": "128k", "iodepth": 32, "sync": 1, "rwmixread": "70"}},
            {"job options": {"bs": "4k"}}
        ]
    });
    let run = extract_run(&doc).unwrap();
    assert_eq!(run.tuple.block_size, "128K");
    assert_eq!(run.tuple.queue_depth, 32);
    assert_eq!(run.tuple.num_jobs, 2);
    assert!(run.tuple.direct);
    assert!(run.tuple.sync);
    assert_eq!(run.tuple.test_size, "10G");
    assert_eq!(run.rwmixread, Some(70));
    assert_eq!(run.fio_version.as_deref(), Some("fio-3.36"));
    assert_eq!(run.document_timestamp.unwrap().calendar_date(), "2025-06-01");
}

#[test]
fn underscore_job_options_key_is_accepted() {
    let doc = json!({"jobs": [{"job_options": {"rw": "write", "numjobs": "4"}}]});
    let run = extract_run(&doc).unwrap();
    assert_eq!(run.tuple.read_write_pattern, "write");
    assert_eq!(run.tuple.num_jobs, 4);
}

// ============================================================================
// SECTION: Malformed Input
// ============================================================================

#[test]
fn documents_without_jobs_are_malformed() {
    for doc in [json!({}), json!({"jobs": []}), json!({"jobs": "x"}), json!([1, 2])] {
        let Err(ExtractError::MalformedInput(_)) = extract_run(&doc) else {
            panic!("expected malformed input for {doc}");
        };
    }
}
