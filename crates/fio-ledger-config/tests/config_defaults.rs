//! Config defaults and section validation tests for fio-ledger-config.
// crates/fio-ledger-config/tests/config_defaults.rs
// =============================================================================
// Module: Config Defaults and Section Validation Tests
// Description: Validate default values and per-section invariants.
// Purpose: Ensure an empty config is usable and bad values fail closed.
// =============================================================================

use fio_ledger_config::ConfigError;
use fio_ledger_config::DEFAULT_MAX_DOCUMENT_BYTES;
use fio_ledger_config::DEFAULT_STORE_PATH;
use fio_ledger_config::LedgerConfig;
use fio_ledger_config::LogLevel;
use fio_ledger_core::Timestamp;
use fio_ledger_core::TrendWindow;
use fio_ledger_store_sqlite::SqliteStoreMode;
use fio_ledger_store_sqlite::SqliteSyncMode;

type TestResult = Result<(), String>;

fn assert_invalid(toml_str: &str, needle: &str) -> TestResult {
    match LedgerConfig::parse(toml_str) {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err(format!("expected invalid config for {toml_str:?}")),
    }
}

#[test]
fn empty_config_applies_defaults() -> TestResult {
    let config = LedgerConfig::parse("").map_err(|err| err.to_string())?;
    if config.store.path.to_string_lossy() != DEFAULT_STORE_PATH {
        return Err("unexpected default store path".to_string());
    }
    if config.store.journal_mode != SqliteStoreMode::Wal || config.store.sync_mode != SqliteSyncMode::Full {
        return Err("unexpected default pragmas".to_string());
    }
    if config.ingest.max_document_bytes != DEFAULT_MAX_DOCUMENT_BYTES {
        return Err("unexpected default document limit".to_string());
    }
    if (config.analysis.default_sla_ms - 20.0).abs() > f64::EPSILON {
        return Err("unexpected default sla".to_string());
    }
    if config.analysis.trend_window().map_err(|err| err.to_string())? != TrendWindow::Days(30) {
        return Err("unexpected default trend window".to_string());
    }
    if config.retention.max_age_days.is_some() || config.logging.level != LogLevel::Info {
        return Err("unexpected retention or logging defaults".to_string());
    }
    Ok(())
}

#[test]
fn unknown_keys_are_rejected() -> TestResult {
    assert_invalid("[store]\nfilename = \"x.sqlite\"\n", "unknown field")?;
    assert_invalid("[reporting]\nenabled = true\n", "unknown field")
}

#[test]
fn store_section_is_validated() -> TestResult {
    assert_invalid("[store]\npath = \"  \"\n", "store.path must be non-empty")?;
    assert_invalid("[store]\nbusy_timeout_ms = 600000\n", "store.busy_timeout_ms")?;
    assert_invalid("[store]\njournal_mode = \"memory\"\n", "unknown variant")
}

#[test]
fn ingest_limits_are_bounded() -> TestResult {
    assert_invalid("[ingest]\nmax_document_bytes = 0\n", "ingest.max_document_bytes")?;
    assert_invalid("[ingest]\nmax_batch_items = 0\n", "ingest.max_batch_items")?;
    assert_invalid("[ingest]\nmax_batch_items = 1000000\n", "ingest.max_batch_items")
}

#[test]
fn analysis_defaults_are_bounded() -> TestResult {
    assert_invalid("[analysis]\ndefault_sla_ms = 0.0\n", "analysis.default_sla_ms")?;
    assert_invalid("[analysis]\ndefault_sla_ms = -3.0\n", "analysis.default_sla_ms")?;
    assert_invalid("[analysis]\ndefault_trend_days = 0\n", "analysis.default_trend_days")?;
    assert_invalid("[analysis]\ndefault_trend_days = 366\n", "analysis.default_trend_days")
}

#[test]
fn retention_requires_a_positive_age() -> TestResult {
    assert_invalid("[retention]\nmax_age_days = 0\n", "retention.max_age_days")?;
    let config =
        LedgerConfig::parse("[retention]\nmax_age_days = 2\n").map_err(|err| err.to_string())?;
    let now = Timestamp::from_unix_millis(10 * 86_400_000);
    if config.retention.cutoff(now) != Some(Timestamp::from_unix_millis(8 * 86_400_000)) {
        return Err("unexpected retention cutoff".to_string());
    }
    Ok(())
}

#[test]
fn log_levels_parse_case_insensitively() -> TestResult {
    let level: LogLevel = "WARN".parse().map_err(|err: ConfigError| err.to_string())?;
    if level != LogLevel::Warn || level.to_string() != "warn" {
        return Err(format!("unexpected level {level}"));
    }
    if "verbose".parse::<LogLevel>().is_ok() {
        return Err("unknown level accepted".to_string());
    }
    Ok(())
}
