//! Hosting harness for the car price charts.
//!
//! Loads the sale export once, runs the chart builders and emits the
//! presenter payloads as JSON (stdout or file) or as a CSV of points.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use car_price_charts::dataset::load_source;
use car_price_charts::output::{print_pretty, to_json, write_json, write_points_csv};
use car_price_charts::series::{build_odometer_trend, build_yearly_trend};
use car_price_charts::{ChartConfig, ChartSeries, MakeModelExplorer, NanPolicy, build_dashboard};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_SOURCE: &str = "data/car_prices.csv";

#[derive(Parser)]
#[command(name = "car_price_charts")]
#[command(about = "Builds used-car price chart series from a sale export", long_about = None)]
struct Cli {
    /// Dataset path or URL (defaults to $CAR_PRICES_SOURCE, then data/car_prices.csv)
    #[arg(short, long, global = true)]
    source: Option<String>,

    /// JSON chart config (defaults to $CHART_CONFIG when set)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Give up on a remote download after this many seconds
    /// (defaults to $CAR_PRICES_TIMEOUT_SECS when set)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Drop rows with non-numeric values instead of averaging them in
    #[arg(long, global = true, default_value_t = false)]
    reject_nan: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all three charts
    Dashboard {
        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Average selling price per model year
    Yearly {
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the points as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Average selling price per odometer bin
    Odometer {
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Odometer chart for one make/model combination
    MakeModel {
        /// Selection as "Make|Model" (defaults to the configured selection)
        #[arg(value_name = "MAKE|MODEL")]
        selection: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// List the selectable make/model combinations
    Catalog {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/car_price_charts.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("car_price_charts.log"));

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

    let config = resolve_config(cli.config, cli.reject_nan)?;
    let source = cli
        .source
        .or_else(|| std::env::var("CAR_PRICES_SOURCE").ok())
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string());

    let timeout = resolve_timeout(cli.timeout_secs)?;

    let dataset = load_source(&source, timeout)
        .await
        .with_context(|| format!("failed to load dataset from '{source}'"))?;
    let records = dataset.records();

    match cli.command {
        Commands::Dashboard { output } => {
            let dashboard = build_dashboard(&dataset, &config);
            emit(output.as_deref(), &dashboard)?;
        }
        Commands::Yearly { output, csv } => {
            let series = build_yearly_trend(records, &config).to_series();
            emit_series(output.as_deref(), csv.as_deref(), &series)?;
        }
        Commands::Odometer { output, csv } => {
            let series = build_odometer_trend(records, &config).to_series(&config);
            emit_series(output.as_deref(), csv.as_deref(), &series)?;
        }
        Commands::MakeModel {
            selection,
            output,
            csv,
        } => {
            let mut explorer = MakeModelExplorer::new(records, &config);
            if let Some(selection) = selection {
                if explorer.on_selection_change(&selection).is_none() {
                    warn!(selection = %selection, "Selection ignored, keeping default");
                }
            }
            match explorer.current() {
                Some(series) => emit_series(output.as_deref(), csv.as_deref(), series)?,
                None => anyhow::bail!("no make/model selection to render"),
            }
        }
        Commands::Catalog { output } => {
            let explorer = MakeModelExplorer::new(records, &config);
            emit(output.as_deref(), &explorer.options())?;
        }
    }

    Ok(())
}

/// Loads the chart config from `--config`, then `$CHART_CONFIG`, else defaults.
fn resolve_config(path: Option<String>, reject_nan: bool) -> Result<ChartConfig> {
    let path = path.or_else(|| std::env::var("CHART_CONFIG").ok());

    let mut config = match path {
        Some(path) => {
            info!(path = %path, "Loading chart config");
            ChartConfig::load(&path)?
        }
        None => ChartConfig::default(),
    };

    if reject_nan {
        config.nan_policy = NanPolicy::Reject;
    }

    Ok(config)
}

/// `--timeout-secs`, then `$CAR_PRICES_TIMEOUT_SECS`, else no timeout.
fn resolve_timeout(flag: Option<u64>) -> Result<Option<Duration>> {
    let secs = match flag {
        Some(secs) => Some(secs),
        None => match std::env::var("CAR_PRICES_TIMEOUT_SECS") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("invalid CAR_PRICES_TIMEOUT_SECS '{raw}'"))?,
            ),
            Err(_) => None,
        },
    };
    Ok(secs.map(Duration::from_secs))
}

fn emit(output: Option<&Path>, value: &impl Serialize) -> Result<()> {
    match output {
        Some(path) => write_json(path, value),
        None => {
            println!("{}", to_json(value)?);
            Ok(())
        }
    }
}

fn emit_series(output: Option<&Path>, csv: Option<&Path>, series: &ChartSeries) -> Result<()> {
    print_pretty(series);
    if let Some(path) = csv {
        write_points_csv(path, series)?;
    }
    emit(output, series)
}
