//! Strategy Reconciler - Main Entry Point
//!
//! Reads brokerage execution exports (JSON arrays of normalized rows) and
//! prints classified positions, contract groups or validation reports as
//! JSON on stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_util::future::try_join_all;
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use strategy_reconciler::common::traits::ExecutionSource;
use strategy_reconciler::config::{load_config, AppConfig};
use strategy_reconciler::ingest::{JsonFileSource, SkipManifest};
use strategy_reconciler::strategy::{ClassifiedPosition, Reconciler, Reconciliation};
use strategy_reconciler::validation::{TradeRecord, TradeValidator, ValidationReport};

/// Exit code used when at least one validated trade is invalid
const INVALID_TRADES_EXIT_CODE: i32 = 2;

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "RECON_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify executions into labeled positions
    Classify {
        /// JSON files, each an array of execution rows; reconciled independently
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },
    /// Print contract groups with their summaries and default strategies
    Groups {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Validate a JSON array of trade records
    Validate {
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyOutput {
    input: String,
    positions: Vec<ClassifiedPosition>,
    manifest: SkipManifest,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateOutput {
    index: usize,
    #[serde(flatten)]
    report: ValidationReport,
}

fn init_tracing(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.settings.log_level)
        .with_context(|| format!("invalid log level {:?}", config.settings.log_level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = if config.settings.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn reconcile_file(reconciler: Reconciler, path: PathBuf) -> Result<(PathBuf, Reconciliation)> {
    let source = JsonFileSource::new(&path);
    let rows = source
        .fetch()
        .await
        .with_context(|| format!("failed to read executions from {}", source.source_name()))?;

    let reconciliation = tokio::task::spawn_blocking(move || reconciler.reconcile(rows))
        .await
        .context("classification task panicked")?;

    if reconciliation.manifest.skipped_count() > 0 {
        warn!(
            input = %path.display(),
            skipped = reconciliation.manifest.skipped_count(),
            "Some execution rows were skipped"
        );
    }
    Ok((path, reconciliation))
}

async fn run_classify(reconciler: &Reconciler, inputs: Vec<PathBuf>) -> Result<()> {
    let tasks = inputs
        .into_iter()
        .map(|path| reconcile_file(reconciler.clone(), path));
    let results = try_join_all(tasks).await?;

    let output: Vec<ClassifyOutput> = results
        .into_iter()
        .map(|(path, reconciliation)| ClassifyOutput {
            input: path.display().to_string(),
            positions: reconciliation.positions,
            manifest: reconciliation.manifest,
        })
        .collect();

    info!(inputs = output.len(), "Classification finished");
    print_json(&output)
}

async fn run_groups(reconciler: &Reconciler, input: PathBuf) -> Result<()> {
    let (_, reconciliation) = reconcile_file(reconciler.clone(), input).await?;
    print_json(&reconciliation.groups)
}

async fn run_validate(validator: &TradeValidator, input: PathBuf) -> Result<bool> {
    let text = tokio::fs::read_to_string(&input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let trades: Vec<TradeRecord> =
        serde_json::from_str(&text).context("expected a JSON array of trade records")?;

    let reports: Vec<ValidateOutput> = trades
        .iter()
        .enumerate()
        .map(|(index, trade)| ValidateOutput {
            index,
            report: validator.validate(trade),
        })
        .collect();
    let invalid = reports.iter().filter(|r| !r.report.is_valid).count();
    debug!(trades = reports.len(), invalid, "Validation finished");

    print_json(&reports)?;
    Ok(invalid == 0)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        config.settings.log_level = level;
    }
    config.settings.log_json |= args.log_json;

    init_tracing(&config)?;
    info!("Starting strategy reconciler");
    debug!(?config, "Configuration loaded");

    let reconciler = Reconciler::new(config.engine.clone());

    match args.command {
        Command::Classify { input } => run_classify(&reconciler, input).await?,
        Command::Groups { input } => run_groups(&reconciler, input).await?,
        Command::Validate { input } => {
            let validator = TradeValidator::new(config.engine.clone());
            if !run_validate(&validator, input).await? {
                std::process::exit(INVALID_TRADES_EXIT_CODE);
            }
        }
    }

    Ok(())
}
