// crates/fio-ledger-store-sqlite/tests/sqlite_ledger.rs
// ============================================================================
// Module: SQLite Run Ledger Tests
// Description: Materialization, administration, and analytics over SQLite.
// Purpose: Validate the one-current-row-per-tuple invariant end to end,
//          including rollback, deletes, edits, purges, and catalogs.
// Dependencies: fio-ledger-core, fio-ledger-store-sqlite, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! Drives [`SqliteRunLedger`] through [`RunIngestor`] with hand-built FIO
//! documents:
//! - Invalidate-then-insert atomicity (including a forced promotion failure)
//! - Bulk idempotence and overwrite
//! - Delete and purge rematerialization
//! - Metadata edits mirrored into the latest-state view
//! - Trend, saturation, filter catalog, and server listings

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

use std::collections::BTreeMap;
use std::path::Path;

use fio_ledger_core::BulkIngestItem;
use fio_ledger_core::BulkIngestRequest;
use fio_ledger_core::CallerIdentity;
use fio_ledger_core::CallerRole;
use fio_ledger_core::ConfigTuple;
use fio_ledger_core::DateRange;
use fio_ledger_core::DeleteOutcome;
use fio_ledger_core::FilterSet;
use fio_ledger_core::IdentitySelector;
use fio_ledger_core::IngestOverrides;
use fio_ledger_core::IngestRequest;
use fio_ledger_core::LedgerError;
use fio_ledger_core::MetadataUpdate;
use fio_ledger_core::Pagination;
use fio_ledger_core::PurgeOutcome;
use fio_ledger_core::RunIdentity;
use fio_ledger_core::RunIngestor;
use fio_ledger_core::RunRecord;
use fio_ledger_core::RunRecordId;
use fio_ledger_core::SortOrder;
use fio_ledger_core::Timestamp;
use fio_ledger_core::TrendMetric;
use fio_ledger_core::TrendQuery;
use fio_ledger_core::TrendWindow;
use fio_ledger_core::UpdateOutcome;
use fio_ledger_core::config_identity;
use fio_ledger_core::performance_data;
use fio_ledger_core::run_identity;
use fio_ledger_store_sqlite::SqliteRunLedger;
use fio_ledger_store_sqlite::SqliteStoreConfig;
use proptest::prelude::*;
use rusqlite::Connection;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const DAY_MS: i64 = 86_400_000;
const NOW_MS: i64 = 1_748_772_000_000;

fn at(offset_ms: i64) -> Timestamp {
    Timestamp::from_unix_millis(NOW_MS + offset_ms)
}

fn ledger_in(temp: &TempDir) -> SqliteRunLedger {
    ledger_at(&temp.path().join("ledger.sqlite"))
}

fn ledger_at(path: &Path) -> SqliteRunLedger {
    SqliteRunLedger::new(SqliteStoreConfig::new(path)).unwrap()
}

fn document(pattern: &str, queue_depth: u32, iops: f64, p95_ns: u64) -> Value {
    json!({
        "fio version": "fio-3.36",
        "jobs": [{
            "jobname": format!("{pattern}_qd{queue_depth}"),
            "job options": {"rw": pattern, "bs": "4k", "iodepth": queue_depth, "direct": "1"},
            "read": {"iops": iops, "io_ops": 10, "bw_bytes": 4096, "lat_ns": {"mean": 100_000.0},
                     "clat_ns": {"percentile": {"95.000000": p95_ns, "99.000000": p95_ns * 2}}}
        }]
    })
}

fn overrides(hostname: &str) -> IngestOverrides {
    IngestOverrides {
        hostname: Some(hostname.to_string()),
        protocol: Some("NVMe-oF".to_string()),
        drive_model: Some("PM1733".to_string()),
        ..IngestOverrides::default()
    }
}

fn ingest(
    ledger: &SqliteRunLedger,
    hostname: &str,
    document: Value,
    now: Timestamp,
) -> Result<RunRecordId, LedgerError> {
    let request = IngestRequest {
        source_name: "run.json".to_string(),
        document,
        overrides: overrides(hostname),
        now,
        actor: None,
    };
    RunIngestor::new(ledger.clone()).ingest(&request)
}

fn all_pages() -> Pagination {
    Pagination::new(Some(1_000), None).unwrap()
}

fn history(ledger: &SqliteRunLedger) -> Vec<RunRecord> {
    ledger
        .list_historical(&FilterSet::new(), &DateRange::default(), SortOrder::OldestFirst, all_pages())
        .unwrap()
        .records
}

fn latest(ledger: &SqliteRunLedger) -> Vec<RunRecord> {
    ledger.list_latest(&FilterSet::new(), all_pages()).unwrap().records
}

fn assert_one_current_row_per_tuple(ledger: &SqliteRunLedger) {
    let mut newest: BTreeMap<ConfigTuple, RunRecordId> = BTreeMap::new();
    for record in history(ledger) {
        let slot = newest.entry(record.tuple.clone()).or_insert(record.id);
        if record.id > *slot {
            *slot = record.id;
        }
    }
    let current = latest(ledger);
    assert_eq!(current.len(), newest.len());
    for record in current {
        assert_eq!(newest.get(&record.tuple), Some(&record.id));
    }
}

fn admin() -> CallerIdentity {
    CallerIdentity::new("ops", CallerRole::Admin)
}

// ============================================================================
// SECTION: Materialization
// ============================================================================

#[test]
fn reingesting_a_tuple_replaces_the_current_row_and_keeps_history() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    let first = ingest(&ledger, "server-01", document("randread", 8, 100.0, 1_000_000), at(0)).unwrap();
    let second = ingest(&ledger, "server-01", document("randread", 8, 200.0, 1_000_000), at(1)).unwrap();

    assert_eq!(history(&ledger).len(), 2);
    let current = latest(&ledger);
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, second);
    assert_ne!(first, second);
    assert_eq!(current[0].metrics.iops, 200.0);
    assert_eq!(current[0].metrics.percentiles.p95(), Some(1.0));
    assert_one_current_row_per_tuple(&ledger);
}

#[test]
fn failed_promotion_rolls_back_the_history_append() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    let ledger = ledger_at(&path);
    let first = ingest(&ledger, "explode", document("read", 1, 100.0, 1_000_000), at(0)).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER fail_promotion BEFORE INSERT ON run_latest WHEN NEW.hostname = 'explode'
         BEGIN SELECT RAISE(ABORT, 'promotion refused'); END;",
    )
    .unwrap();

    let Err(LedgerError::Storage { retryable, .. }) =
        ingest(&ledger, "explode", document("read", 1, 999.0, 1_000_000), at(1))
    else {
        panic!("expected storage failure");
    };
    assert!(retryable);
    assert_eq!(history(&ledger).len(), 1);
    let current = latest(&ledger);
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, first);
    assert_eq!(current[0].metrics.iops, 100.0);
}

#[test]
fn bulk_reimport_skips_duplicates_unless_overwriting() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    let ingestor = RunIngestor::new(ledger.clone());
    let request = |overwrite: bool| BulkIngestRequest {
        items: vec![BulkIngestItem {
            source_name: "sweep.json".to_string(),
            document: Ok(document("write", 4, 50.0, 2_000_000)),
        }],
        overrides: overrides("server-02"),
        overwrite,
        dry_run: false,
        now: at(0),
        actor: Some(admin()),
    };

    let first = ingestor.bulk_ingest(&request(false)).unwrap();
    let second = ingestor.bulk_ingest(&request(false)).unwrap();
    assert_eq!((first.imported, first.skipped), (1, 0));
    assert_eq!((second.imported, second.skipped), (0, 1));
    assert_eq!(history(&ledger).len(), 1);

    let forced = ingestor.bulk_ingest(&request(true)).unwrap();
    assert_eq!(forced.imported, 1);
    assert_eq!(history(&ledger).len(), 2);
    assert_eq!(latest(&ledger).len(), 1);
    assert_one_current_row_per_tuple(&ledger);
}

#[test]
fn ledger_persists_across_instances() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    let id = ingest(&ledger_at(&path), "server-01", document("read", 1, 1.0, 1_000), at(0)).unwrap();
    let reopened = ledger_at(&path);
    assert_eq!(latest(&reopened)[0].id, id);
}

// ============================================================================
// SECTION: Delete and Purge
// ============================================================================

#[test]
fn delete_counts_missing_ids_without_failing() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    ingest(&ledger, "server-01", document("read", 1, 1.0, 1_000), at(0)).unwrap();
    ingest(&ledger, "server-01", document("write", 1, 1.0, 1_000), at(1)).unwrap();

    let ids = [RunRecordId::new(1), RunRecordId::new(2), RunRecordId::new(999)];
    let outcome = ledger.delete(&ids, Some(&admin())).unwrap();
    assert_eq!(outcome, DeleteOutcome { deleted: 2, not_found: 1 });
    assert!(history(&ledger).is_empty());
    assert!(latest(&ledger).is_empty());
    assert_eq!(serde_json::to_value(outcome).unwrap(), json!({"deleted": 2, "notFound": 1}));
}

#[test]
fn deleting_the_current_row_promotes_the_previous_one() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    let older = ingest(&ledger, "server-01", document("read", 1, 1.0, 1_000), at(0)).unwrap();
    let newer = ingest(&ledger, "server-01", document("read", 1, 2.0, 1_000), at(1)).unwrap();

    ledger.delete(&[newer], None).unwrap();
    let current = latest(&ledger);
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, older);
    assert_one_current_row_per_tuple(&ledger);
}

#[test]
fn deleting_a_non_current_row_keeps_the_newest_insert_current() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    ingest(&ledger, "server-01", document("read", 1, 1.0, 1_000), at(10)).unwrap();
    let middle = ingest(&ledger, "server-01", document("read", 1, 2.0, 1_000), at(5)).unwrap();
    let newest = ingest(&ledger, "server-01", document("read", 1, 3.0, 1_000), at(7)).unwrap();
    assert_eq!(latest(&ledger)[0].id, newest);

    ledger.delete(&[middle], None).unwrap();
    let current = latest(&ledger);
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, newest);
    assert_one_current_row_per_tuple(&ledger);
}

#[test]
fn purge_removes_old_rows_and_rebuilds_current_rows() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    // Ingested out of order: the current row is older than its sibling.
    let recent = ingest(&ledger, "server-01", document("read", 1, 1.0, 1_000), at(5 * DAY_MS)).unwrap();
    ingest(&ledger, "server-01", document("read", 1, 2.0, 1_000), at(0)).unwrap();
    ingest(&ledger, "server-02", document("write", 1, 3.0, 1_000), at(0)).unwrap();
    let kept = ingest(&ledger, "server-03", document("read", 1, 4.0, 1_000), at(6 * DAY_MS)).unwrap();

    let outcome = ledger.purge_older_than(at(3 * DAY_MS), Some(&admin())).unwrap();
    assert_eq!(
        outcome,
        PurgeOutcome {
            deleted_history: 2,
            deleted_latest: 2,
            rematerialized: 1,
        }
    );
    let mut ids: Vec<RunRecordId> = latest(&ledger).iter().map(|record| record.id).collect();
    ids.sort();
    assert_eq!(ids, vec![recent, kept]);
    assert_one_current_row_per_tuple(&ledger);
}

// ============================================================================
// SECTION: Metadata Edits
// ============================================================================

#[test]
fn description_edits_reach_both_views() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    let id = ingest(&ledger, "server-01", document("read", 1, 1.0, 1_000), at(0)).unwrap();
    let update = MetadataUpdate {
        description: Some("baseline after firmware 2.1".to_string()),
        ..MetadataUpdate::default()
    };

    let outcome = ledger.update_metadata(&[id, RunRecordId::new(42)], &update, None).unwrap();
    assert_eq!(outcome, UpdateOutcome { updated: 1, not_found: 1 });
    assert_eq!(history(&ledger)[0].metadata.description, "baseline after firmware 2.1");
    assert_eq!(latest(&ledger)[0].metadata.description, "baseline after firmware 2.1");
}

#[test]
fn hostname_edits_recompute_identities_and_move_the_current_row() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    let id = ingest(&ledger, "old-host", document("read", 1, 1.0, 1_000), at(0)).unwrap();
    let update = MetadataUpdate {
        hostname: Some("new-host".to_string()),
        ..MetadataUpdate::default()
    };

    ledger.update_metadata(&[id], &update, Some(&admin())).unwrap();
    let current = latest(&ledger);
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].tuple.hostname, "new-host");
    assert_eq!(current[0].config_identity, config_identity("new-host"));
    assert_eq!(
        current[0].run_identity,
        run_identity("new-host", &current[0].metadata.test_date).unwrap()
    );
    let old_host = FilterSet::new().parse_csv("hostname", "old-host").unwrap();
    assert_eq!(ledger.list_latest(&old_host, all_pages()).unwrap().total, 0);
    assert_one_current_row_per_tuple(&ledger);
}

#[test]
fn relabeling_onto_an_existing_tuple_keeps_one_current_row() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    ingest(&ledger, "host-a", document("read", 1, 1.0, 1_000), at(0)).unwrap();
    let moved = ingest(&ledger, "host-b", document("read", 1, 2.0, 1_000), at(1)).unwrap();
    let update = MetadataUpdate {
        hostname: Some("host-a".to_string()),
        ..MetadataUpdate::default()
    };

    ledger.update_metadata(&[moved], &update, None).unwrap();
    let current = latest(&ledger);
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, moved);
    assert_one_current_row_per_tuple(&ledger);
}

#[test]
fn identity_edits_cover_every_row_of_the_run() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    ingest(&ledger, "server-01", document("read", 1, 1.0, 1_000), at(0)).unwrap();
    ingest(&ledger, "server-01", document("read", 2, 1.0, 1_000), at(1)).unwrap();
    ingest(&ledger, "server-09", document("read", 1, 1.0, 1_000), at(2)).unwrap();
    let update = MetadataUpdate {
        test_name: Some("qd sweep".to_string()),
        ..MetadataUpdate::default()
    };
    let selector = IdentitySelector::Config(config_identity("server-01"));

    let outcome = ledger.update_by_identity(&selector, &update, None).unwrap();
    assert_eq!(outcome.updated, 2);
    let renamed = latest(&ledger).iter().filter(|record| record.metadata.test_name == "qd sweep").count();
    assert_eq!(renamed, 2);

    let missing = IdentitySelector::Run(RunIdentity::new("no-such-run"));
    let Err(LedgerError::NotFound(_)) = ledger.update_by_identity(&missing, &update, None) else {
        panic!("expected not found");
    };
}

#[test]
fn invalid_edits_are_rejected_before_touching_storage() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    let update = MetadataUpdate {
        description: Some("x".repeat(1_001)),
        ..MetadataUpdate::default()
    };
    let Err(LedgerError::Validation(err)) = ledger.update_metadata(&[RunRecordId::new(1)], &update, None)
    else {
        panic!("expected validation failure");
    };
    assert_eq!(err.field, "description");
}

// ============================================================================
// SECTION: Listings and Catalogs
// ============================================================================

#[test]
fn historical_listing_applies_filters_ranges_and_pages() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    for (index, depth) in [1_u32, 2, 4, 8].into_iter().enumerate() {
        let offset = i64::try_from(index).unwrap() * DAY_MS;
        ingest(&ledger, "server-01", document("randread", depth, 10.0, 1_000), at(offset)).unwrap();
    }
    ingest(&ledger, "server-01", document("randwrite", 1, 10.0, 1_000), at(0)).unwrap();

    let filters = FilterSet::new().parse_csv("read_write_pattern", "randread").unwrap();
    let range = DateRange::new(Some(at(DAY_MS)), None).unwrap();
    let page = ledger
        .list_historical(&filters, &range, SortOrder::NewestFirst, Pagination::new(Some(2), None).unwrap())
        .unwrap();
    assert_eq!(page.total, 3);
    assert!(page.has_more);
    let depths: Vec<u32> = page.records.iter().map(|record| record.tuple.queue_depth).collect();
    assert_eq!(depths, vec![8, 4]);

    let depth_filter = FilterSet::new().parse_csv("queue_depth", "1,8").unwrap();
    assert_eq!(ledger.list_latest(&depth_filter, all_pages()).unwrap().total, 3);
}

#[test]
fn filter_catalog_and_servers_reflect_the_latest_state() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    ingest(&ledger, "server-02", document("read", 4, 1.0, 1_000), at(0)).unwrap();
    ingest(&ledger, "server-01", document("write", 1, 1.0, 1_000), at(1)).unwrap();
    ingest(&ledger, "server-01", document("read", 1, 1.0, 1_000), at(2)).unwrap();

    let options = ledger.filter_options().unwrap();
    assert_eq!(options.hostnames, vec!["server-01", "server-02"]);
    assert_eq!(options.patterns, vec!["read", "write"]);
    assert_eq!(options.queue_depths, vec![1, 4]);
    assert_eq!(options.directs, vec![true]);
    assert_eq!(
        options.host_disk_combinations,
        vec!["server-01 - NVMe-oF - PM1733", "server-02 - NVMe-oF - PM1733"]
    );

    let servers = ledger.list_servers().unwrap();
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[0].hostname, "server-01");
    assert_eq!(servers[0].test_count, 2);
    assert_eq!(servers[0].first_test, at(1));
    assert_eq!(servers[0].last_test, at(2));
}

#[test]
fn get_runs_keeps_request_order_and_reports_missing_ids() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    let first = ingest(&ledger, "server-01", document("read", 1, 100.0, 1_000), at(0)).unwrap();
    let second = ingest(&ledger, "server-01", document("read", 2, 1_500.0, 2_000_000), at(1)).unwrap();

    let lookup = ledger.get_runs(&[second, RunRecordId::new(77), first, second]).unwrap();
    let ids: Vec<RunRecordId> = lookup.records.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![second, first]);
    assert_eq!(lookup.not_found, vec![RunRecordId::new(77)]);
    assert_eq!(serde_json::to_value(&lookup).unwrap()["not_found"], json!([77]));

    let readings = performance_data(&lookup.records[..1], &[TrendMetric::Iops, TrendMetric::P95Latency]);
    assert_eq!(
        serde_json::to_value(&readings).unwrap(),
        json!([{
            "id": 2,
            "metrics": {
                "iops": {"value": 1_500.0, "unit": "IOPS"},
                "p95_latency": {"value": 2.0, "unit": "ms"}
            }
        }])
    );
    assert!(ledger.get_runs(&[]).unwrap().records.is_empty());
}

// ============================================================================
// SECTION: Analytics
// ============================================================================

#[test]
fn trend_reads_the_host_history_in_time_order() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    for (day, iops) in [(0, 100.0), (1, 110.0), (2, 121.0)] {
        ingest(&ledger, "server-01", document("read", 1, iops, 1_000), at(day * DAY_MS)).unwrap();
    }
    ingest(&ledger, "server-02", document("read", 1, 5.0, 1_000), at(DAY_MS)).unwrap();

    let query = TrendQuery::new("server-01", TrendMetric::Iops, TrendWindow::days(30).unwrap()).unwrap();
    let report = ledger.trend(&query, at(3 * DAY_MS)).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(report.points.len(), 3);
    assert_eq!(json["trend_analysis"]["overall_change"], "+21.00%");
    assert_eq!(json["data"][1]["percent_change"], "+10.00%");

    let empty = TrendQuery::new("nobody", TrendMetric::Iops, TrendWindow::days(7).unwrap()).unwrap();
    let json = serde_json::to_value(ledger.trend(&empty, at(0)).unwrap()).unwrap();
    assert_eq!(json["trend_analysis"]["message"], "No data found for the specified period");
}

#[test]
fn saturation_walks_a_stored_sweep() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    let ingestor = RunIngestor::new(ledger.clone());
    let steps = [(1_u32, 2_000_000_u64), (4, 5_000_000), (8, 9_000_000), (16, 40_000_000), (32, 80_000_000)];
    for (index, (depth, p95_ns)) in steps.into_iter().enumerate() {
        let request = IngestRequest {
            source_name: format!("qd{depth}.json"),
            document: document("randread", depth, f64::from(depth) * 1_000.0, p95_ns),
            overrides: IngestOverrides {
                test_date: Some("2025-06-01T08:00:00Z".to_string()),
                ..overrides("server-01")
            },
            now: at(i64::try_from(index).unwrap()),
            actor: None,
        };
        ingestor.ingest(&request).unwrap();
    }

    let identity = run_identity("server-01", "2025-06-01").unwrap();
    let report = ledger.saturation(&identity, 20.0).unwrap();
    let pattern = &report.patterns["randread"];
    assert_eq!(pattern.steps.len(), 5);
    assert_eq!(pattern.sweet_spot.as_ref().unwrap().total_outstanding, 8);
    assert_eq!(pattern.saturation_point.as_ref().unwrap().total_outstanding, 16);

    let Err(LedgerError::NotFound(_)) = ledger.saturation(&RunIdentity::new("missing"), 20.0) else {
        panic!("expected not found");
    };
    let Err(LedgerError::Validation(err)) = ledger.saturation(&identity, 0.0) else {
        panic!("expected validation failure");
    };
    assert_eq!(err.field, "threshold_ms");
}

// ============================================================================
// SECTION: Properties
// ============================================================================

#[derive(Debug, Clone)]
enum Step {
    Ingest { host: u8, depth: u8 },
    Delete { id: u8 },
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0_u8 .. 3, 0_u8 .. 3).prop_map(|(host, depth)| Step::Ingest { host, depth }),
        1 => (1_u8 .. 12).prop_map(|id| Step::Delete { id }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn every_tuple_with_history_has_exactly_one_current_row(
        steps in prop::collection::vec(step_strategy(), 1 .. 12)
    ) {
        let temp = TempDir::new().unwrap();
        let ledger = ledger_in(&temp);
        for (index, step) in steps.into_iter().enumerate() {
            let now = at(i64::try_from(index).unwrap());
            match step {
                Step::Ingest { host, depth } => {
                    let doc = document("randrw", 1 << depth, 1.0, 1_000);
                    ingest(&ledger, &format!("host-{host}"), doc, now).unwrap();
                }
                Step::Delete { id } => {
                    ledger.delete(&[RunRecordId::new(i64::from(id))], None).unwrap();
                }
            }
            assert_one_current_row_per_tuple(&ledger);
        }
    }
}
