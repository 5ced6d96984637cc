//! materialize - Audio dataset materializer
//!
//! Moves audio files from a source directory into `target_dir/data` under
//! random 8-hex-digit names and appends one JSON line per file to
//! `target_dir/metadata.jsonl`.
//!
//! Exit codes follow [`Outcome`]: 0 success, 1 fatal error, 2 finished with
//! per-file failures (or, for `verify`, problems found).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use dataset_common::config::{load_toml_file, resolve_config_file};
use dataset_materializer::config::{ConfigOverrides, MaterializeConfig, TomlConfig};
use dataset_materializer::metadata::{read_entries, LogSummary};
use dataset_materializer::verify::verify_dataset;
use dataset_materializer::{Materializer, Outcome};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const APP_NAME: &str = "dataset-materializer";

/// Command-line arguments for materialize
#[derive(Parser, Debug)]
#[command(name = "materialize")]
#[command(about = "Move audio files into a dataset and record their metadata")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "DATASET_CONFIG")]
    config: Option<PathBuf>,

    /// Log level filter (overrides RUST_LOG and the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Move matching files into the dataset (default)
    Run(RunArgs),
    /// Summarize the metadata log
    Inspect(DatasetArgs),
    /// Check the metadata log against the data directory
    Verify(DatasetArgs),
}

#[derive(ClapArgs, Debug, Default)]
struct RunArgs {
    /// Directory containing the audio files to move
    #[arg(short, long, env = "DATASET_SOURCE_DIR")]
    source_dir: Option<PathBuf>,

    #[command(flatten)]
    dataset: DatasetArgs,

    /// Class label for every record (repeat or comma-separate for several)
    #[arg(short, long = "label", env = "DATASET_LABEL", value_delimiter = ',')]
    labels: Vec<String>,

    /// File extension to match (default .wav)
    #[arg(short, long)]
    extension: Option<String>,

    /// Record SHA-256 of each moved file
    #[arg(long)]
    checksum: bool,

    /// Record the original file name of each moved file
    #[arg(long)]
    record_source_name: bool,

    /// Skip files without a RIFF/WAVE header
    #[arg(long)]
    verify_header: bool,
}

#[derive(ClapArgs, Debug, Default)]
struct DatasetArgs {
    /// Dataset root directory
    #[arg(short, long, env = "DATASET_TARGET_DIR")]
    target_dir: Option<PathBuf>,

    /// Prefix for `file_name` in records (default ./<target dir name>/data)
    #[arg(long)]
    file_name_prefix: Option<String>,
}

impl From<RunArgs> for ConfigOverrides {
    fn from(args: RunArgs) -> Self {
        Self {
            source_dir: args.source_dir,
            target_dir: args.dataset.target_dir,
            labels: args.labels,
            extension: args.extension,
            file_name_prefix: args.dataset.file_name_prefix,
            checksum: args.checksum,
            record_source_name: args.record_source_name,
            verify_header: args.verify_header,
        }
    }
}

impl From<DatasetArgs> for ConfigOverrides {
    fn from(args: DatasetArgs) -> Self {
        Self {
            target_dir: args.target_dir,
            file_name_prefix: args.file_name_prefix,
            ..Default::default()
        }
    }
}

fn main() -> ExitCode {
    let result = try_main();
    if let Err(e) = &result {
        eprintln!("Error: {:?}", e);
    }
    ExitCode::from(Outcome::of(&result).exit_code())
}

fn try_main() -> Result<Outcome> {
    let args = Args::parse();

    let config_path = resolve_config_file(args.config.as_deref(), "DATASET_CONFIG", APP_NAME);
    let file_config: Option<TomlConfig> = config_path
        .as_deref()
        .map(load_toml_file::<TomlConfig>)
        .transpose()
        .context("Failed to load configuration file")?;

    init_tracing(args.log_level.as_deref(), file_config.as_ref());

    if let Some(path) = &config_path {
        info!("Configuration file: {}", path.display());
    }

    match args.command.unwrap_or(Command::Run(args.run)) {
        Command::Run(run) => run_materialize(run.into(), file_config.as_ref()),
        Command::Inspect(dataset) => run_inspect(dataset.into(), file_config.as_ref()),
        Command::Verify(dataset) => run_verify(dataset.into(), file_config.as_ref()),
    }
}

/// Initialize tracing
///
/// Filter priority: `--log-level`, then `RUST_LOG`, then `[logging] level`
/// from the config file, then `info` for this crate.
fn init_tracing(cli_level: Option<&str>, file_config: Option<&TomlConfig>) {
    let filter = match cli_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = file_config
                .map(|c| c.logging.level.as_str())
                .unwrap_or("info");
            format!("dataset_materializer={level},materialize={level},dataset_common={level}")
                .into()
        }),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn run_materialize(overrides: ConfigOverrides, file: Option<&TomlConfig>) -> Result<Outcome> {
    let config =
        MaterializeConfig::resolve(overrides, file).context("Invalid configuration")?;

    let report = Materializer::new(config)
        .run()
        .context("Dataset materialization failed")?;

    if report.is_complete() {
        info!("Moved {} files into the dataset", report.entries.len());
        return Ok(report.outcome());
    }

    for skipped in &report.skipped {
        warn!("Not moved: {} ({})", skipped.path.display(), skipped.reason);
    }
    for orphan in &report.orphaned {
        warn!("Moved without metadata: {}", orphan.display());
    }
    for error in &report.scan_errors {
        warn!("Not listed: {}", error);
    }
    warn!(
        "Partial run: {} recorded, {} skipped, {} without metadata, {} unlisted",
        report.entries.len(),
        report.skipped.len(),
        report.orphaned.len(),
        report.scan_errors.len()
    );
    Ok(report.outcome())
}

fn run_inspect(overrides: ConfigOverrides, file: Option<&TomlConfig>) -> Result<Outcome> {
    let config =
        MaterializeConfig::resolve(overrides, file).context("Invalid configuration")?;
    let path = config.metadata_path();

    let entries = read_entries(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let summary = LogSummary::from_entries(&entries);

    println!("{}", path.display());
    println!("{}", summary);
    Ok(Outcome::Success)
}

fn run_verify(overrides: ConfigOverrides, file: Option<&TomlConfig>) -> Result<Outcome> {
    let config =
        MaterializeConfig::resolve(overrides, file).context("Invalid configuration")?;
    let path = config.metadata_path();

    let entries = read_entries(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let report = verify_dataset(&config.data_dir(), &config.record_prefix(), &entries);

    for name in &report.missing_files {
        println!("missing file:   {}", name);
    }
    for name in &report.duplicate_records {
        println!("duplicate:      {}", name);
    }
    for name in &report.unresolvable {
        println!("unknown prefix: {}", name);
    }
    for path in &report.orphan_files {
        println!("no record:      {}", path.display());
    }
    println!("checked {} records", report.checked);

    Ok(report.outcome())
}
