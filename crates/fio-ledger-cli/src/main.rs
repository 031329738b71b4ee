// crates/fio-ledger-cli/src/main.rs
// ============================================================================
// Module: fio-ledger CLI Entry Point
// Description: Command dispatcher for ingestion, listing, analysis, and admin.
// Purpose: Expose every ledger operation as a subcommand with JSON output.
// Dependencies: clap, fio-ledger-config, fio-ledger-core, fio-ledger-store-sqlite, tracing
// ============================================================================

//! ## Overview
//! The `fio-ledger` binary opens the configured `SQLite` ledger and runs one
//! operation per invocation. Results are printed as pretty JSON on stdout;
//! logs go to stderr at the configured level. Input documents are read with
//! a hard size limit before parsing.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::ArgAction;
use clap::ArgGroup;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use fio_ledger_config::ConfigError;
use fio_ledger_config::LedgerConfig;
use fio_ledger_config::LogLevel;
use fio_ledger_core::BulkIngestItem;
use fio_ledger_core::BulkIngestRequest;
use fio_ledger_core::CallerIdentity;
use fio_ledger_core::CallerRole;
use fio_ledger_core::ConfigIdentity;
use fio_ledger_core::DateRange;
use fio_ledger_core::FilterSet;
use fio_ledger_core::IdentitySelector;
use fio_ledger_core::IngestOverrides;
use fio_ledger_core::IngestRequest;
use fio_ledger_core::LedgerError;
use fio_ledger_core::MetadataUpdate;
use fio_ledger_core::Pagination;
use fio_ledger_core::RunIdentity;
use fio_ledger_core::RunIngestor;
use fio_ledger_core::RunRecordId;
use fio_ledger_core::SortOrder;
use fio_ledger_core::Timestamp;
use fio_ledger_core::TrendMetric;
use fio_ledger_core::TrendQuery;
use fio_ledger_core::TrendWindow;
use fio_ledger_core::ValidationError;
use fio_ledger_core::performance_data;
use fio_ledger_store_sqlite::SqliteRunLedger;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tracing::Level;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tracing target for CLI events.
const LOG_TARGET: &str = "fio_ledger::cli";
/// File extension collected when importing a directory.
const DOCUMENT_EXTENSION: &str = "json";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "fio-ledger", version, about = "FIO benchmark result ledger", disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to fio-ledger.toml or `FIO_LEDGER_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Log level override: error, warn, info, debug, or trace.
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,
    /// `SQLite` store path (overrides config).
    #[arg(long = "store-path", value_name = "PATH", global = true)]
    store_path: Option<PathBuf>,
    /// Caller name recorded with administrative operations.
    #[arg(long, value_name = "NAME", global = true)]
    actor: Option<String>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest one FIO JSON result document.
    Ingest(IngestCommand),
    /// Bulk-import FIO documents from files or directories.
    Import(ImportCommand),
    /// List the latest result of each configuration.
    Latest(LatestCommand),
    /// List historical results.
    History(HistoryCommand),
    /// Show stored runs by id.
    Show(ShowCommand),
    /// Analyze one metric over time for a host.
    Trend(TrendCommand),
    /// Find the sweet spot and saturation point of a run's sweep.
    Saturation(SaturationCommand),
    /// Edit descriptive metadata of stored runs.
    Update(UpdateCommand),
    /// Delete runs by id.
    Delete(DeleteCommand),
    /// Remove runs older than a cutoff.
    Purge(PurgeCommand),
    /// List the distinct values of every filterable field.
    Filters,
    /// List tested hosts and drives.
    Servers,
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the configuration and report its source.
    Validate,
}

/// Label overrides applied to ingested documents.
#[derive(Args, Debug, Clone, Default)]
struct OverrideArgs {
    /// Hostname label.
    #[arg(long, value_name = "NAME")]
    hostname: Option<String>,
    /// Storage protocol label.
    #[arg(long, value_name = "NAME")]
    protocol: Option<String>,
    /// Drive type label.
    #[arg(long = "drive-type", value_name = "TYPE")]
    drive_type: Option<String>,
    /// Drive model label.
    #[arg(long = "drive-model", value_name = "MODEL")]
    drive_model: Option<String>,
    /// Free-form description.
    #[arg(long, value_name = "TEXT")]
    description: Option<String>,
    /// Test date (ISO 8601); defaults to the document timestamp.
    #[arg(long = "test-date", value_name = "DATE")]
    test_date: Option<String>,
}

impl OverrideArgs {
    /// Converts the arguments into ingestion overrides.
    fn into_overrides(self) -> IngestOverrides {
        IngestOverrides {
            hostname: self.hostname,
            protocol: self.protocol,
            drive_type: self.drive_type,
            drive_model: self.drive_model,
            description: self.description,
            test_date: self.test_date,
        }
    }
}

/// Arguments for `ingest`.
#[derive(Args, Debug)]
struct IngestCommand {
    /// FIO JSON result file.
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Label overrides.
    #[command(flatten)]
    overrides: OverrideArgs,
}

/// Arguments for `import`.
#[derive(Args, Debug)]
struct ImportCommand {
    /// Files or directories of `.json` documents.
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,
    /// Insert even when the same document is already stored for its configuration.
    #[arg(long, action = ArgAction::SetTrue)]
    overwrite: bool,
    /// Report what would be imported without writing.
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    dry_run: bool,
    /// Label overrides applied to every document.
    #[command(flatten)]
    overrides: OverrideArgs,
}

/// Filter and page arguments shared by listings.
#[derive(Args, Debug, Clone, Default)]
struct ListArgs {
    /// Field filter as `FIELD=V1,V2` (repeatable).
    #[arg(long = "filter", value_name = "FIELD=VALUES", value_parser = parse_assignment)]
    filters: Vec<(String, String)>,
    /// Maximum rows returned (1..=1000).
    #[arg(long, value_name = "COUNT")]
    limit: Option<u32>,
    /// Rows skipped.
    #[arg(long, value_name = "COUNT")]
    offset: Option<u64>,
}

/// Arguments for `latest`.
#[derive(Args, Debug)]
struct LatestCommand {
    /// Filters and paging.
    #[command(flatten)]
    list: ListArgs,
}

/// Arguments for `history`.
#[derive(Args, Debug)]
struct HistoryCommand {
    /// Filters and paging.
    #[command(flatten)]
    list: ListArgs,
    /// Inclusive lower bound (RFC 3339 or YYYY-MM-DD).
    #[arg(long, value_name = "TIME", value_parser = parse_timestamp)]
    from: Option<Timestamp>,
    /// Inclusive upper bound (RFC 3339 or YYYY-MM-DD).
    #[arg(long, value_name = "TIME", value_parser = parse_timestamp)]
    to: Option<Timestamp>,
    /// Order oldest first instead of newest first.
    #[arg(long = "oldest-first", action = ArgAction::SetTrue)]
    oldest_first: bool,
    /// Return every row of one run identity instead of a filtered page.
    #[arg(long = "run-identity", value_name = "ID", conflicts_with_all = ["filters", "from", "to"])]
    run_identity: Option<String>,
}

/// Arguments for `show`.
#[derive(Args, Debug)]
struct ShowCommand {
    /// Run id to show (repeatable).
    #[arg(long = "id", value_name = "ID", required = true)]
    ids: Vec<i64>,
    /// Report only these metrics with their units (repeatable).
    #[arg(long = "metric", value_enum, value_name = "METRIC")]
    metrics: Vec<MetricArg>,
}

/// Metric names accepted by `trend` and `show`.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum MetricArg {
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

impl From<MetricArg> for TrendMetric {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::Iops => Self::Iops,
            MetricArg::AvgLatency => Self::AvgLatency,
            MetricArg::Bandwidth => Self::Bandwidth,
            MetricArg::P95Latency => Self::P95Latency,
            MetricArg::P99Latency => Self::P99Latency,
        }
    }
}

/// Arguments for `trend`.
#[derive(Args, Debug)]
struct TrendCommand {
    /// Host to analyze.
    #[arg(long, value_name = "NAME")]
    hostname: String,
    /// Metric to analyze.
    #[arg(long, value_enum, default_value_t = MetricArg::Iops)]
    metric: MetricArg,
    /// Lookback in days (defaults to `analysis.default_trend_days`).
    #[arg(long, value_name = "DAYS", conflicts_with_all = ["from", "to"])]
    days: Option<u32>,
    /// Explicit window start.
    #[arg(long, value_name = "TIME", value_parser = parse_timestamp)]
    from: Option<Timestamp>,
    /// Explicit window end.
    #[arg(long, value_name = "TIME", value_parser = parse_timestamp)]
    to: Option<Timestamp>,
}

/// Arguments for `saturation`.
#[derive(Args, Debug)]
struct SaturationCommand {
    /// Run identity of the sweep.
    #[arg(long = "run-identity", value_name = "ID")]
    run_identity: String,
    /// p95 budget in milliseconds (defaults to `analysis.default_sla_ms`).
    #[arg(long = "threshold-ms", value_name = "MS")]
    threshold_ms: Option<f64>,
}

/// Arguments for `update`.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["ids", "config_identity", "run_identity"])))]
struct UpdateCommand {
    /// Run id to edit (repeatable).
    #[arg(long = "id", value_name = "ID")]
    ids: Vec<i64>,
    /// Edit every run sharing this configuration identity.
    #[arg(long = "config-identity", value_name = "ID")]
    config_identity: Option<String>,
    /// Edit every run sharing this run identity.
    #[arg(long = "run-identity", value_name = "ID")]
    run_identity: Option<String>,
    /// Field assignment as `FIELD=VALUE` (repeatable).
    #[arg(long = "set", value_name = "FIELD=VALUE", required = true, value_parser = parse_assignment)]
    fields: Vec<(String, String)>,
}

/// Arguments for `delete`.
#[derive(Args, Debug)]
struct DeleteCommand {
    /// Run id to delete (repeatable).
    #[arg(long = "id", value_name = "ID", required = true)]
    ids: Vec<i64>,
}

/// Arguments for `purge`.
#[derive(Args, Debug)]
struct PurgeCommand {
    /// Remove runs recorded before this time.
    #[arg(long = "older-than", value_name = "TIME", value_parser = parse_timestamp, conflicts_with = "older_than_days")]
    older_than: Option<Timestamp>,
    /// Remove runs recorded more than this many days ago.
    #[arg(long = "older-than-days", value_name = "DAYS")]
    older_than_days: Option<u32>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

impl From<LedgerError> for CliError {
    fn from(error: LedgerError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<ValidationError> for CliError {
    fn from(error: ValidationError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::new(error.to_string())
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Bounded read failures.
#[derive(Debug, Error)]
enum ReadLimitError {
    /// I/O failure.
    #[error("{0}")]
    Io(std::io::Error),
    /// Input exceeds the limit.
    #[error("size {size} exceeds limit {limit}")]
    TooLarge {
        /// Observed size in bytes.
        size: u64,
        /// Limit in bytes.
        limit: u64,
    },
}

/// Document loading failures.
#[derive(Debug, Error)]
enum DocumentError {
    /// The file could not be read within the limit.
    #[error("failed to read {path}: {error}")]
    Read {
        /// Offending file.
        path: String,
        /// Underlying failure.
        error: ReadLimitError,
    },
    /// The file is not JSON.
    #[error("{path} is not valid json: {error}")]
    Json {
        /// Offending file.
        path: String,
        /// Parser failure.
        error: serde_json::Error,
    },
}

impl From<DocumentError> for CliError {
    fn from(error: DocumentError) -> Self {
        Self::new(error.to_string())
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = LedgerConfig::load(cli.config.as_deref())?;
    init_logging(cli.log_level.unwrap_or(config.logging.level));
    debug!(
        target: LOG_TARGET,
        source = %config.source.as_ref().map_or_else(|| "defaults".to_string(), |path| path.display().to_string()),
        "configuration loaded"
    );
    let context = Context {
        config,
        store_path: cli.store_path,
        actor: cli.actor.map(|name| CallerIdentity::new(name, CallerRole::Admin)),
    };

    match cli.command {
        Commands::Ingest(command) => command_ingest(&context, command),
        Commands::Import(command) => command_import(&context, command),
        Commands::Latest(command) => command_latest(&context, &command),
        Commands::History(command) => command_history(&context, &command),
        Commands::Show(command) => command_show(&context, &command),
        Commands::Trend(command) => command_trend(&context, &command),
        Commands::Saturation(command) => command_saturation(&context, &command),
        Commands::Update(command) => command_update(&context, command),
        Commands::Delete(command) => command_delete(&context, &command),
        Commands::Purge(command) => command_purge(&context, &command),
        Commands::Filters => command_filters(&context),
        Commands::Servers => command_servers(&context),
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(&context),
    }
}

/// Installs the stderr log subscriber.
fn init_logging(level: LogLevel) {
    let level = match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_ansi(false)
        .try_init();
}

/// Resolved settings shared by every command.
struct Context {
    /// Loaded configuration.
    config: LedgerConfig,
    /// Store path override.
    store_path: Option<PathBuf>,
    /// Caller recorded with administrative operations.
    actor: Option<CallerIdentity>,
}

impl Context {
    /// Opens the `SQLite` ledger.
    fn open_ledger(&self) -> CliResult<SqliteRunLedger> {
        let mut store = self.config.store.sqlite_config();
        if let Some(path) = &self.store_path {
            store.path.clone_from(path);
        }
        SqliteRunLedger::new(store)
            .map_err(|err| CliError::new(format!("failed to open store: {err}")))
    }

    /// Builds an ingestor honoring the configured batch limit.
    fn ingestor(&self) -> CliResult<RunIngestor<SqliteRunLedger>> {
        Ok(RunIngestor::new(self.open_ledger()?)
            .with_max_batch_items(self.config.ingest.max_batch_items))
    }
}

// ============================================================================
// SECTION: Ingestion Commands
// ============================================================================

/// Executes `ingest`.
fn command_ingest(context: &Context, command: IngestCommand) -> CliResult<ExitCode> {
    let document = load_document(&command.file, context.config.ingest.max_document_bytes)?;
    let request = IngestRequest {
        source_name: source_name(&command.file),
        document,
        overrides: command.overrides.into_overrides(),
        now: now()?,
        actor: context.actor.clone(),
    };
    let id = context.ingestor()?.ingest(&request)?;
    write_json(&json!({ "id": id }))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `import`.
fn command_import(context: &Context, command: ImportCommand) -> CliResult<ExitCode> {
    let limit = context.config.ingest.max_document_bytes;
    let items = collect_sources(&command.paths)?
        .into_iter()
        .map(|path| BulkIngestItem {
            source_name: source_name(&path),
            document: load_document(&path, limit).map_err(|err| err.to_string()),
        })
        .collect();
    let request = BulkIngestRequest {
        items,
        overrides: command.overrides.into_overrides(),
        overwrite: command.overwrite,
        dry_run: command.dry_run,
        now: now()?,
        actor: context.actor.clone(),
    };
    let report = context.ingestor()?.bulk_ingest(&request)?;
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Listing Commands
// ============================================================================

/// Executes `latest`.
fn command_latest(context: &Context, command: &LatestCommand) -> CliResult<ExitCode> {
    let filters = build_filters(&command.list.filters)?;
    let pagination = Pagination::new(command.list.limit, command.list.offset)?;
    let page = context.open_ledger()?.list_latest(&filters, pagination)?;
    write_json(&page)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `history`.
fn command_history(context: &Context, command: &HistoryCommand) -> CliResult<ExitCode> {
    let ledger = context.open_ledger()?;
    if let Some(run_identity) = &command.run_identity {
        let records = ledger.history_for_run(&RunIdentity::new(run_identity.clone()))?;
        write_json(&records)?;
        return Ok(ExitCode::SUCCESS);
    }
    let filters = build_filters(&command.list.filters)?;
    let range = DateRange::new(command.from, command.to)?;
    let pagination = Pagination::new(command.list.limit, command.list.offset)?;
    let order = if command.oldest_first { SortOrder::OldestFirst } else { SortOrder::NewestFirst };
    let page = ledger.list_historical(&filters, &range, order, pagination)?;
    write_json(&page)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `show`.
fn command_show(context: &Context, command: &ShowCommand) -> CliResult<ExitCode> {
    let ids: Vec<RunRecordId> = command.ids.iter().copied().map(RunRecordId::new).collect();
    let lookup = context.open_ledger()?.get_runs(&ids)?;
    if command.metrics.is_empty() {
        write_json(&lookup)?;
    } else {
        let metrics: Vec<TrendMetric> = command.metrics.iter().copied().map(TrendMetric::from).collect();
        let readings = performance_data(&lookup.records, &metrics);
        write_json(&json!({ "performance_data": readings, "not_found": lookup.not_found }))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `filters`.
fn command_filters(context: &Context) -> CliResult<ExitCode> {
    write_json(&context.open_ledger()?.filter_options()?)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `servers`.
fn command_servers(context: &Context) -> CliResult<ExitCode> {
    write_json(&context.open_ledger()?.list_servers()?)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Analysis Commands
// ============================================================================

/// Executes `trend`.
fn command_trend(context: &Context, command: &TrendCommand) -> CliResult<ExitCode> {
    let window = if command.from.is_some() || command.to.is_some() {
        TrendWindow::Range(DateRange::new(command.from, command.to)?)
    } else if let Some(days) = command.days {
        TrendWindow::days(days)?
    } else {
        context.config.analysis.trend_window()?
    };
    let query = TrendQuery::new(command.hostname.clone(), command.metric.into(), window)?;
    let report = context.open_ledger()?.trend(&query, now()?)?;
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `saturation`.
fn command_saturation(context: &Context, command: &SaturationCommand) -> CliResult<ExitCode> {
    let threshold_ms = command.threshold_ms.unwrap_or(context.config.analysis.default_sla_ms);
    let run_identity = RunIdentity::new(command.run_identity.clone());
    let report = context.open_ledger()?.saturation(&run_identity, threshold_ms)?;
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Administrative Commands
// ============================================================================

/// Executes `update`.
fn command_update(context: &Context, command: UpdateCommand) -> CliResult<ExitCode> {
    let fields: BTreeMap<String, String> = command.fields.into_iter().collect();
    let update = MetadataUpdate::from_fields(fields)?;
    let ledger = context.open_ledger()?;
    let actor = context.actor.as_ref();
    let outcome = if let Some(identity) = command.config_identity {
        ledger.update_by_identity(&IdentitySelector::Config(ConfigIdentity::new(identity)), &update, actor)?
    } else if let Some(identity) = command.run_identity {
        ledger.update_by_identity(&IdentitySelector::Run(RunIdentity::new(identity)), &update, actor)?
    } else {
        let ids: Vec<RunRecordId> = command.ids.into_iter().map(RunRecordId::new).collect();
        ledger.update_metadata(&ids, &update, actor)?
    };
    write_json(&outcome)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `delete`.
fn command_delete(context: &Context, command: &DeleteCommand) -> CliResult<ExitCode> {
    let ids: Vec<RunRecordId> = command.ids.iter().copied().map(RunRecordId::new).collect();
    let outcome = context.open_ledger()?.delete(&ids, context.actor.as_ref())?;
    write_json(&outcome)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `purge`.
fn command_purge(context: &Context, command: &PurgeCommand) -> CliResult<ExitCode> {
    let cutoff = purge_cutoff(command, &context.config, now()?)?;
    let outcome = context.open_ledger()?.purge_older_than(cutoff, context.actor.as_ref())?;
    write_json(&json!({ "cutoff": cutoff.to_rfc3339(), "outcome": outcome }))?;
    Ok(ExitCode::SUCCESS)
}

/// Resolves the purge cutoff from flags, then the retention policy.
fn purge_cutoff(command: &PurgeCommand, config: &LedgerConfig, now: Timestamp) -> CliResult<Timestamp> {
    if let Some(cutoff) = command.older_than {
        return Ok(cutoff);
    }
    if let Some(days) = command.older_than_days {
        return Ok(now.minus_days(days));
    }
    config.retention.cutoff(now).ok_or_else(|| {
        CliError::new(
            "no purge cutoff: pass --older-than or --older-than-days, or set retention.max_age_days"
                .to_string(),
        )
    })
}

/// Executes `config validate`.
fn command_config_validate(context: &Context) -> CliResult<ExitCode> {
    let store_path = context.store_path.as_ref().unwrap_or(&context.config.store.path);
    write_json(&json!({
        "valid": true,
        "source": context.config.source.as_ref().map(|path| path.display().to_string()),
        "store_path": store_path.display().to_string(),
    }))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Parses a `KEY=VALUE` argument.
fn parse_assignment(value: &str) -> Result<(String, String), String> {
    let Some((key, rest)) = value.split_once('=') else {
        return Err(format!("expected KEY=VALUE, got {value}"));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in {value}"));
    }
    Ok((key.to_string(), rest.to_string()))
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
fn parse_timestamp(value: &str) -> Result<Timestamp, String> {
    Timestamp::parse(value).ok_or_else(|| format!("invalid timestamp: {value}"))
}

/// Compiles `--filter` arguments into a filter set.
fn build_filters(pairs: &[(String, String)]) -> Result<FilterSet, ValidationError> {
    pairs.iter().try_fold(FilterSet::new(), |set, (field, csv)| set.parse_csv(field, csv))
}

/// Expands directories into their `.json` files, sorted by path.
fn collect_sources(paths: &[PathBuf]) -> CliResult<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for path in paths {
        if !path.is_dir() {
            sources.push(path.clone());
            continue;
        }
        let read_error =
            |err: std::io::Error| CliError::new(format!("failed to read directory {}: {err}", path.display()));
        let mut found = Vec::new();
        for entry in fs::read_dir(path).map_err(read_error)? {
            let candidate = entry.map_err(read_error)?.path();
            let is_document = candidate
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION));
            if candidate.is_file() && is_document {
                found.push(candidate);
            }
        }
        found.sort();
        sources.extend(found);
    }
    Ok(sources)
}

/// Returns the file name used as the source label.
fn source_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

/// Reads and parses one JSON document within the size limit.
fn load_document(path: &Path, max_bytes: u64) -> Result<Value, DocumentError> {
    let label = path.display().to_string();
    let bytes = read_bytes_with_limit(path, max_bytes).map_err(|error| DocumentError::Read {
        path: label.clone(),
        error,
    })?;
    serde_json::from_slice(&bytes).map_err(|error| DocumentError::Json {
        path: label,
        error,
    })
}

/// Reads a file, failing closed when it exceeds `max_bytes`.
fn read_bytes_with_limit(path: &Path, max_bytes: u64) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    if size > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut limited = file.take(max_bytes.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    if actual > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Returns the current wall-clock time.
fn now() -> CliResult<Timestamp> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| CliError::new(format!("system clock before unix epoch: {err}")))?;
    let millis = i64::try_from(elapsed.as_millis())
        .map_err(|_| CliError::new("system clock out of range".to_string()))?;
    Ok(Timestamp::from_unix_millis(millis))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a value as pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to render output: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Reports an error on stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
