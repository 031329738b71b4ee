// crates/fio-ledger-config/src/config.rs
// ============================================================================
// Module: fio-ledger Configuration
// Description: Configuration loading and validation for fio-ledger.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: fio-ledger-core, fio-ledger-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then [`CONFIG_ENV_VAR`], then
//! `fio-ledger.toml` in the working directory. Only the last of these may be
//! absent, in which case the built-in defaults apply. Unknown keys and
//! out-of-range values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use fio_ledger_core::Timestamp;
use fio_ledger_core::TrendWindow;
use fio_ledger_store_sqlite::SqliteStoreConfig;
use fio_ledger_store_sqlite::SqliteStoreMode;
use fio_ledger_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "fio-ledger.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "FIO_LEDGER_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default `SQLite` database file.
pub const DEFAULT_STORE_PATH: &str = "fio-ledger.sqlite";
/// Default `SQLite` busy timeout in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum `SQLite` busy timeout in milliseconds.
const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;
/// Default maximum size of one FIO document (the upload limit of 50 MiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 50 * 1024 * 1024;
/// Hard ceiling for `ingest.max_document_bytes`.
const MAX_DOCUMENT_BYTES_CEILING: u64 = 1024 * 1024 * 1024;
/// Default maximum number of documents in one bulk import.
pub const DEFAULT_MAX_BATCH_ITEMS: usize = 1_000;
/// Hard ceiling for `ingest.max_batch_items`.
const MAX_BATCH_ITEMS_CEILING: usize = 100_000;
/// Default p95 latency budget for saturation analysis.
pub const DEFAULT_SLA_MS: f64 = 20.0;
/// Default trend lookback in days.
pub const DEFAULT_TREND_DAYS: u32 = 30;
/// Maximum retention age in days.
const MAX_RETENTION_DAYS: u32 = 36_500;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// fio-ledger configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Run ledger storage.
    #[serde(default)]
    pub store: StoreConfig,
    /// Ingestion limits.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Analysis defaults.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Retention policy.
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// File the config was read from; `None` when defaults were used.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl LedgerConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(resolved) = resolve_path(path)? else {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        };
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::parse(content)?;
        config.source = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.ingest.validate()?;
        self.analysis.validate()?;
        self.retention.validate()?;
        Ok(())
    }
}

/// `SQLite` run ledger configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// `SQLite` database path.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("store.path", &self.path.to_string_lossy())?;
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "store.busy_timeout_ms must be at most {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }

    /// Builds the `SQLite` ledger configuration.
    #[must_use]
    pub fn sqlite_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: self.path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        }
    }
}

/// Ingestion limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Maximum size of one FIO document in bytes.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
    /// Maximum number of documents accepted by one bulk import.
    #[serde(default = "default_max_batch_items")]
    pub max_batch_items: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: default_max_document_bytes(),
            max_batch_items: default_max_batch_items(),
        }
    }
}

impl IngestConfig {
    /// Validates ingestion limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_document_bytes == 0 || self.max_document_bytes > MAX_DOCUMENT_BYTES_CEILING {
            return Err(ConfigError::Invalid(format!(
                "ingest.max_document_bytes must be between 1 and {MAX_DOCUMENT_BYTES_CEILING}"
            )));
        }
        if self.max_batch_items == 0 || self.max_batch_items > MAX_BATCH_ITEMS_CEILING {
            return Err(ConfigError::Invalid(format!(
                "ingest.max_batch_items must be between 1 and {MAX_BATCH_ITEMS_CEILING}"
            )));
        }
        Ok(())
    }
}

/// Analysis defaults applied when a request omits them.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// p95 latency budget for saturation analysis, in milliseconds.
    #[serde(default = "default_sla_ms")]
    pub default_sla_ms: f64,
    /// Trend lookback in days.
    #[serde(default = "default_trend_days")]
    pub default_trend_days: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_sla_ms: default_sla_ms(),
            default_trend_days: default_trend_days(),
        }
    }
}

impl AnalysisConfig {
    /// Validates analysis defaults.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_sla_ms.is_finite() || self.default_sla_ms <= 0.0 {
            return Err(ConfigError::Invalid(
                "analysis.default_sla_ms must be a positive number".to_string(),
            ));
        }
        self.trend_window()?;
        Ok(())
    }

    /// Returns the default trend window.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the day count is out of range.
    pub fn trend_window(&self) -> Result<TrendWindow, ConfigError> {
        TrendWindow::days(self.default_trend_days)
            .map_err(|err| ConfigError::Invalid(format!("analysis.default_trend_days {}", err.reason)))
    }
}

/// Retention policy for historical rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Rows older than this many days are purged; `None` keeps everything.
    #[serde(default)]
    pub max_age_days: Option<u32>,
}

impl RetentionConfig {
    /// Validates the retention policy.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.max_age_days {
            Some(0) => Err(ConfigError::Invalid(
                "retention.max_age_days must be greater than zero".to_string(),
            )),
            Some(days) if days > MAX_RETENTION_DAYS => Err(ConfigError::Invalid(format!(
                "retention.max_age_days must be at most {MAX_RETENTION_DAYS}"
            ))),
            _ => Ok(()),
        }
    }

    /// Returns the purge cutoff relative to `now`, if retention is enabled.
    #[must_use]
    pub fn cutoff(&self, now: Timestamp) -> Option<Timestamp> {
        self.max_age_days.map(|days| now.minus_days(days))
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level written to stderr.
    #[serde(default)]
    pub level: LogLevel,
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Operational events.
    #[default]
    Info,
    /// Diagnostic detail.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// Returns the canonical level name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(ConfigError::Invalid(format!("unknown log level: {other}"))),
        }
    }
}

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default store path.
fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

/// Default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Default document size limit.
const fn default_max_document_bytes() -> u64 {
    DEFAULT_MAX_DOCUMENT_BYTES
}

/// Default bulk import size.
const fn default_max_batch_items() -> usize {
    DEFAULT_MAX_BATCH_ITEMS
}

/// Default latency budget.
const fn default_sla_ms() -> f64 {
    DEFAULT_SLA_MS
}

/// Default trend lookback.
const fn default_trend_days() -> u32 {
    DEFAULT_TREND_DAYS
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; `None` means "use defaults".
fn resolve_path(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default.is_file().then_some(default))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::panic, clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use std::path::Path;

    use super::ConfigError;
    use super::validate_path;
    use super::validate_path_string;

    #[test]
    fn validate_path_string_accepts_valid_path() {
        validate_path_string("store.path", "data/fio-ledger.sqlite").unwrap();
    }

    #[test]
    fn validate_path_string_rejects_whitespace_only() {
        let Err(ConfigError::Invalid(message)) = validate_path_string("store.path", "   ") else {
            panic!("expected invalid path");
        };
        assert_eq!(message, "store.path must be non-empty");
    }

    #[test]
    fn validate_path_string_rejects_component_too_long() {
        let value = format!("data/{}", "a".repeat(256));
        let Err(ConfigError::Invalid(message)) = validate_path_string("store.path", &value) else {
            panic!("expected invalid path");
        };
        assert!(message.contains("store.path path component too long"));
    }

    #[test]
    fn validate_path_accepts_component_at_max() {
        validate_path(Path::new(&"a".repeat(255))).unwrap();
    }
}
