// crates/fio-ledger-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: End-to-end runs of the fio-ledger binary against a temp store.
// Purpose: Ensure subcommands wire through to the ledger and print JSON.
// Dependencies: fio-ledger-cli binary, serde_json, tempfile
// ============================================================================
//! ## Overview
//! Drives the `fio-ledger` binary with an explicit config file and store path
//! inside a temp directory, then checks the JSON written to stdout and the
//! exit status of failing invocations.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn fio_ledger_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_fio-ledger"))
}

fn run(dir: &TempDir, args: &[&str]) -> Output {
    let config = dir.path().join("fio-ledger.toml");
    if !config.exists() {
        fs::write(&config, "[logging]\nlevel = \"warn\"\n").unwrap();
    }
    Command::new(fio_ledger_bin())
        .arg("--config")
        .arg(&config)
        .arg("--store-path")
        .arg(dir.path().join("ledger.sqlite"))
        .args(args)
        .env_remove("FIO_LEDGER_CONFIG")
        .output()
        .unwrap()
}

fn success_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn failure_message(output: &Output) -> String {
    assert!(!output.status.success(), "command unexpectedly succeeded");
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_document(path: &Path, queue_depth: u32, iops: f64) {
    let document = json!({
        "fio version": "fio-3.36",
        "jobs": [{
            "jobname": format!("randread_qd{queue_depth}"),
            "job options": {"rw": "randread", "bs": "4k", "iodepth": queue_depth, "direct": "1"},
            "read": {"iops": iops, "io_ops": 10, "bw_bytes": 4096, "lat_ns": {"mean": 100_000.0},
                     "clat_ns": {"percentile": {"95.000000": 200_000, "99.000000": 400_000}}}
        }]
    });
    fs::write(path, serde_json::to_vec_pretty(&document).unwrap()).unwrap();
}

fn ingest(dir: &TempDir, queue_depth: u32, iops: f64) -> Value {
    let path = dir.path().join(format!("qd{queue_depth}.json"));
    write_document(&path, queue_depth, iops);
    success_json(&run(
        dir,
        &["ingest", path.to_str().unwrap(), "--hostname", "host-a", "--protocol", "NVMe-oF"],
    ))
}

// ============================================================================
// SECTION: Ingestion
// ============================================================================

#[test]
fn ingest_keeps_history_and_one_latest_row() {
    let dir = TempDir::new().unwrap();
    assert_eq!(ingest(&dir, 1, 1_000.0), json!({"id": 1}));
    assert_eq!(ingest(&dir, 1, 1_100.0), json!({"id": 2}));

    let latest = success_json(&run(&dir, &["latest"]));
    assert_eq!(latest["total"], 1);
    let record = &latest["records"][0];
    assert_eq!(record["id"], 2);
    assert_eq!(record["tuple"]["hostname"], "host-a");
    assert_eq!(record["tuple"]["protocol"], "NVMe-oF");

    let history = success_json(&run(&dir, &["history", "--oldest-first"]));
    assert_eq!(history["total"], 2);
    assert_eq!(history["records"][0]["id"], 1);

    let run_identity = record["run_identity"].as_str().unwrap();
    let runs = success_json(&run(&dir, &["history", "--run-identity", run_identity]));
    assert_eq!(runs.as_array().map(Vec::len), Some(2));
}

#[test]
fn show_fetches_runs_by_id() {
    let dir = TempDir::new().unwrap();
    ingest(&dir, 4, 2_500.0);

    let shown = success_json(&run(&dir, &["show", "--id", "1", "--id", "9"]));
    assert_eq!(shown["records"].as_array().map(Vec::len), Some(1));
    assert_eq!(shown["records"][0]["tuple"]["queue_depth"], 4);
    assert_eq!(shown["not_found"], json!([9]));

    let readings = success_json(&run(&dir, &["show", "--id", "1", "--metric", "iops", "--metric", "p95-latency"]));
    let metrics = &readings["performance_data"][0]["metrics"];
    assert_eq!(metrics["iops"], json!({"value": 2_500.0, "unit": "IOPS"}));
    assert_eq!(metrics["p95_latency"], json!({"value": 0.2, "unit": "ms"}));
    assert_eq!(readings["not_found"], json!([]));
}

#[test]
fn import_reports_failures_and_skips_duplicates() {
    let dir = TempDir::new().unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    write_document(&docs.join("a.json"), 1, 1_000.0);
    write_document(&docs.join("b.json"), 2, 1_800.0);
    fs::write(docs.join("c.json"), b"{\"jobs\": [").unwrap();
    let docs_arg = docs.to_str().unwrap();

    let first = success_json(&run(&dir, &["import", docs_arg, "--hostname", "host-a"]));
    assert_eq!(first["total"], 3);
    assert_eq!(first["processed"], 2);
    assert_eq!(first["imported"], 2);
    assert_eq!(first["errors"].as_array().map(Vec::len), Some(1));

    let second = success_json(&run(&dir, &["import", docs_arg, "--hostname", "host-a"]));
    assert_eq!(second["imported"], 0);
    assert_eq!(second["skipped"], 2);
}

#[test]
fn dry_run_import_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("one.json");
    write_document(&path, 4, 2_000.0);

    let report =
        success_json(&run(&dir, &["import", path.to_str().unwrap(), "--dry-run", "--hostname", "h"]));
    assert_eq!(report["previews"].as_array().map(Vec::len), Some(1));
    assert_eq!(report["previews"][0]["tuple"]["queue_depth"], 4);

    let latest = success_json(&run(&dir, &["latest"]));
    assert_eq!(latest["total"], 0);
}

// ============================================================================
// SECTION: Administration
// ============================================================================

#[test]
fn update_then_delete_round_through_the_store() {
    let dir = TempDir::new().unwrap();
    ingest(&dir, 1, 1_000.0);

    let updated =
        success_json(&run(&dir, &["--actor", "ops", "update", "--id", "1", "--set", "description=tuned"]));
    assert_eq!(updated, json!({"updated": 1, "notFound": 0}));
    let latest = success_json(&run(&dir, &["latest"]));
    assert_eq!(latest["records"][0]["metadata"]["description"], "tuned");

    let deleted = success_json(&run(&dir, &["delete", "--id", "1", "--id", "42"]));
    assert_eq!(deleted, json!({"deleted": 1, "notFound": 1}));
    assert_eq!(success_json(&run(&dir, &["latest"]))["total"], 0);
}

#[test]
fn purge_without_a_cutoff_fails() {
    let dir = TempDir::new().unwrap();
    let message = failure_message(&run(&dir, &["purge"]));
    assert!(message.contains("no purge cutoff"), "stderr: {message}");
}

#[test]
fn purge_with_an_old_cutoff_keeps_recent_runs() {
    let dir = TempDir::new().unwrap();
    ingest(&dir, 1, 1_000.0);
    let purged = success_json(&run(&dir, &["purge", "--older-than", "2000-01-01"]));
    assert_eq!(purged["outcome"]["deletedHistory"], 0);
    assert_eq!(success_json(&run(&dir, &["latest"]))["total"], 1);
}

// ============================================================================
// SECTION: Catalogs and Analysis
// ============================================================================

#[test]
fn filters_and_servers_describe_stored_runs() {
    let dir = TempDir::new().unwrap();
    ingest(&dir, 1, 1_000.0);
    ingest(&dir, 8, 4_000.0);

    let filters = success_json(&run(&dir, &["filters"]));
    assert_eq!(filters["hostnames"], json!(["host-a"]));
    assert_eq!(filters["queue_depths"], json!([1, 8]));

    let servers = success_json(&run(&dir, &["servers"]));
    assert_eq!(servers[0]["hostname"], "host-a");
    assert_eq!(servers[0]["test_count"], 2);
}

#[test]
fn trend_reports_recent_points() {
    let dir = TempDir::new().unwrap();
    ingest(&dir, 1, 1_000.0);
    let report = success_json(&run(&dir, &["trend", "--hostname", "host-a", "--metric", "iops"]));
    assert_eq!(report["hostname"], "host-a");
    assert_eq!(report["data"].as_array().map(Vec::len), Some(1));
}

#[test]
fn invalid_filter_field_fails() {
    let dir = TempDir::new().unwrap();
    let message = failure_message(&run(&dir, &["latest", "--filter", "color=red"]));
    assert!(message.contains("invalid"), "stderr: {message}");
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

#[test]
fn config_validate_reports_source_and_store() {
    let dir = TempDir::new().unwrap();
    let report = success_json(&run(&dir, &["config", "validate"]));
    assert_eq!(report["valid"], true);
    assert!(report["source"].as_str().unwrap().ends_with("fio-ledger.toml"));
    assert!(report["store_path"].as_str().unwrap().ends_with("ledger.sqlite"));
}

#[test]
fn config_validate_rejects_unknown_keys() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("fio-ledger.toml"), "[store]\nfilename = \"x\"\n").unwrap();
    let message = failure_message(&run(&dir, &["config", "validate"]));
    assert!(message.contains("unknown field"), "stderr: {message}");
}
