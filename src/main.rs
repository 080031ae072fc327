//! CLI entry point for the BMRCL ridership dataset builder.
//!
//! Converts the raw RTI spreadsheet exports into the published Parquet and
//! zipped CSV datasets, optionally adding a fare/revenue dataset.

use anyhow::{Result, bail};
use bmrcl_ridership::config::RunConfig;
use bmrcl_ridership::output::update_summary;
use bmrcl_ridership::pipeline::{
    build_station_hourly, build_station_pair, convert, enrich_station_pairs,
};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bmrcl_ridership")]
#[command(about = "Builds the BMRCL hourly ridership datasets", long_about = None)]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PathArgs {
    /// Directory holding the raw sheet exports and reference files
    #[arg(long, global = true, default_value = "raw")]
    raw_dir: PathBuf,

    /// Directory the datasets are written to
    #[arg(short, long, global = true, default_value = "data")]
    output_dir: PathBuf,

    /// Field delimiter of the raw sheet exports
    #[arg(long, global = true, default_value_t = ',')]
    delimiter: char,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every dataset (revenue too, when fare reference data is present)
    Convert,
    /// Build only the station-hourly dataset
    StationHourly,
    /// Build only the station-pair-hourly dataset
    StationPair,
    /// Build the station-pair revenue dataset
    Enrich {
        /// Fare slabs file (slab;max_stations;fare)
        #[arg(long)]
        fare_slabs: Option<PathBuf>,

        /// Station lines file (line;sequence;station)
        #[arg(long)]
        station_lines: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bmrcl_ridership.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bmrcl_ridership.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = run_config(&cli.paths)?;

    match cli.command {
        Commands::Convert => {
            convert(&config)?;
        }
        Commands::StationHourly => {
            let summary = build_station_hourly(&config)?;
            update_summary(&config.summary_path(), vec![summary], &[])?;
        }
        Commands::StationPair => {
            let (_, summary) = build_station_pair(&config)?;
            update_summary(&config.summary_path(), vec![summary], &[])?;
        }
        Commands::Enrich {
            fare_slabs,
            station_lines,
        } => {
            let mut config = config;
            if let Some(path) = fare_slabs {
                config.fare_slabs = path;
            }
            if let Some(path) = station_lines {
                config.station_lines = path;
            }

            let summary = enrich_station_pairs(&config)?;
            info!(
                records = summary.records,
                total_revenue = %summary.total_revenue.unwrap_or_default(),
                "Enrichment complete"
            );
        }
    }

    Ok(())
}

fn run_config(paths: &PathArgs) -> Result<RunConfig> {
    let Ok(delimiter) = u8::try_from(paths.delimiter) else {
        bail!("delimiter {:?} is not a single-byte character", paths.delimiter);
    };
    Ok(RunConfig::new(&paths.raw_dir, paths.output_dir.clone()).with_delimiter(delimiter))
}
