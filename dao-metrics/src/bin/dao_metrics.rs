//! dao-metrics command line
//!
//! Analyzes every CSV file below a directory and prints the corpus report.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use dao_metrics::logging::setup::{init_logging, LoggingConfig};
use dao_metrics::prelude::*;
use dao_metrics::sources::resolve_version;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory searched recursively for CSV files
    #[arg(long)]
    data_dir: PathBuf,

    /// Dataset registry (JSON); the built-in registry is used when omitted
    #[arg(long)]
    registry: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Directory holding version_info.json
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Write one JSON render series per dataset into this directory
    #[arg(long)]
    series_out: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Pin "today" (YYYY-MM-DD) instead of reading the system clock
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(LoggingConfig::default().with_json_format(args.log_json)) {
        eprintln!("failed to initialize logging: {e}");
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "dao-metrics failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let clock: Arc<dyn Clock> = match args.today {
        Some(date) => Arc::new(FixedClock::at_date(date)),
        None => Arc::new(SystemClock),
    };
    let registry = match &args.registry {
        Some(path) => DatasetRegistry::from_path(path)?,
        None => DatasetRegistry::builtin(),
    };

    let source = CsvDirectorySource::new(&args.data_dir).with_clock(clock.clone());
    let version = match &args.backup_dir {
        Some(dir) => resolve_version(&source, &VersionStore::new(dir)).await?,
        None => source.version().await?,
    };

    let pipeline = MetricsPipeline::new(PipelineConfig::default())
        .with_registry(registry)
        .with_clock(clock);
    let run = pipeline.run_source(&source).await?;

    if let Some(dir) = &args.series_out {
        let mut writer = JsonSeriesWriter::new(dir);
        let written = pipeline.render(&run, &mut writer)?;
        if written == 0 {
            warn!("No dataset has temporal data; no series written");
        }
    }

    match args.format {
        OutputFormat::Human => {
            let formatter = HumanFormatter::with_config(
                FormatterConfig::default().with_colors(std::io::stdout().is_terminal()),
            );
            print!("{}", formatter.format_version(&version)?);
            println!("{}", formatter.format(&run.corpus)?);
        }
        OutputFormat::Json => {
            let document = serde_json::json!({ "version": version, "report": run.corpus });
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }

    Ok(())
}
