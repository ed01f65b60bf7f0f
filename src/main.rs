//! CLI entry point for the fleet trip analyzer.
//!
//! Provides subcommands for the full report pipeline, outlier listing,
//! data-quality summaries, visit counting, and input cleaning.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use fleet_trip_analyzer::analyzers::aggregate::{AggregateOptions, aggregate_period};
use fleet_trip_analyzer::analyzers::odometer::{
    odometer_deltas, sort_for_analysis, summarize_by_vehicle,
};
use fleet_trip_analyzer::analyzers::outliers;
use fleet_trip_analyzer::analyzers::period::Period;
use fleet_trip_analyzer::analyzers::quality::column_quality;
use fleet_trip_analyzer::analyzers::{fuel, trips};
use fleet_trip_analyzer::config::RunConfig;
use fleet_trip_analyzer::loader::{load_raw, load_trips};
use fleet_trip_analyzer::model::{NUMERIC_COLUMNS, TripRecord};
use fleet_trip_analyzer::report::{charts, tables};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fleet_trip_analyzer")]
#[command(about = "A batch report generator for fleet-vehicle trip logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: aggregate tables and charts for every vehicle
    Report {
        /// Path to the trip-log CSV
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Directory to write tables and charts into
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,

        /// Optional JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip PNG chart rendering
        #[arg(long, default_value_t = false)]
        no_charts: bool,
    },
    /// List rows outside the interquartile fence for a numeric column
    Outliers {
        /// Path to the trip-log CSV
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Column to scan, e.g. "End Odometer" or "Stop Duration"
        #[arg(value_name = "COLUMN")]
        column: String,

        /// Directory to write the outlier listing into
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,

        /// Optional JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Per-column missing/unique counts for the input file
    Quality {
        /// Path to the trip-log CSV
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Directory to write the quality table into
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,
    },
    /// Per-day unique and total visit counts per vehicle
    Visits {
        /// Path to the trip-log CSV
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// CSV file to write the visit counts to
        #[arg(short, long, default_value = "visits_per_day.csv")]
        output: PathBuf,

        /// Optional JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Normalize dates and durations into a cleaned copy of the input
    Clean {
        /// Path to the trip-log CSV
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// CSV file to write the cleaned rows to
        #[arg(short, long, default_value = "cleaned_trips.csv")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/fleet_trip_analyzer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fleet_trip_analyzer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            input,
            output,
            config,
            no_charts,
        } => {
            let config = RunConfig::load(config.as_deref())?;
            run_report(&input, &output, &config, no_charts)?;
        }
        Commands::Outliers {
            input,
            column,
            output,
            config,
        } => {
            let config = RunConfig::load(config.as_deref())?;
            run_outliers(&input, &column, &output, &config)?;
        }
        Commands::Quality { input, output } => {
            run_quality(&input, &output)?;
        }
        Commands::Visits {
            input,
            output,
            config,
        } => {
            let config = RunConfig::load(config.as_deref())?;
            run_visits(&input, &output, &config)?;
        }
        Commands::Clean { input, output } => {
            run_clean(&input, &output)?;
        }
    }

    Ok(())
}

/// Loads, filters, and sorts the trip table for analysis.
fn load_for_analysis(input: &Path, config: &RunConfig) -> Result<Vec<TripRecord>> {
    let (mut records, _) = load_trips(input)?;
    records.retain(|record| config.retains(&record.vehicle));
    if records.is_empty() {
        warn!("No records left after the vehicle filter");
    }
    sort_for_analysis(&mut records);
    Ok(records)
}

#[tracing::instrument(skip(config), fields(input = %input.display(), output = %output.display()))]
fn run_report(input: &Path, output: &Path, config: &RunConfig, no_charts: bool) -> Result<()> {
    let records = load_for_analysis(input, config)?;

    let deltas = odometer_deltas(&records, config.negative_delta_policy);
    tables::write_delta_summaries(output, &summarize_by_vehicle(&records, &deltas))?;

    for period in Period::ALL {
        let options = AggregateOptions {
            excluded_destinations: config.excluded_destinations.clone(),
            top_n: config.top_n.for_period(period),
        };
        let report = aggregate_period(&records, period, &options);

        tables::write_period_summaries(output, period, &report)?;
        tables::write_top_locations(output, period, &report)?;

        if !no_charts {
            for (vehicle, series) in &report.series {
                let ranking = report.overall_ranking(vehicle, options.top_n);
                charts::render_top_locations(output, vehicle, period, &ranking)?;
                charts::render_visit_series(output, vehicle, period, series)?;
                charts::render_driving_series(output, vehicle, period, series)?;
            }
        }
    }

    let summary = trips::summarize(&records, config.work_hours);
    let durations = trips::duration_distribution(&records, 5.0);
    tables::write_fleet_summary(output, &summary, &durations)?;
    tables::write_common_locations(output, &trips::common_locations(&records))?;

    if let Some(reference_path) = &config.fuel_reference {
        let references = fuel::load_references(reference_path)?;
        let joined = fuel::join_references(&records, &references);
        tables::write_fuel_totals(output, &fuel::vehicle_totals(&joined))?;

        let trend = fuel::monthly_economy_trend(&joined);
        tables::write_fuel_trend(output, &trend)?;
        if !no_charts {
            charts::render_fuel_trend(output, &trend)?;
        }
    }

    info!(trips = records.len(), "Report complete");
    Ok(())
}

#[tracing::instrument(skip(config), fields(input = %input.display()))]
fn run_outliers(input: &Path, column: &str, output: &Path, config: &RunConfig) -> Result<()> {
    if !NUMERIC_COLUMNS.contains(&column) {
        bail!(
            "'{column}' is not a numeric column; expected one of: {}",
            NUMERIC_COLUMNS.join(", ")
        );
    }

    let records = load_for_analysis(input, config)?;
    let flagged = outliers::detect(&records, |record| {
        record.numeric_field(column).ok().flatten()
    });

    info!(
        column,
        flagged = flagged.len(),
        total = records.len(),
        "Outlier scan complete"
    );
    tables::write_outliers(output, column, &records, &flagged)
}

#[tracing::instrument(fields(input = %input.display()))]
fn run_quality(input: &Path, output: &Path) -> Result<()> {
    let (headers, rows) = load_raw(input)?;
    let quality = column_quality(&headers, &rows);

    for column in &quality {
        info!(
            column = %column.column,
            missing = column.missing,
            unique = column.unique,
            "Column quality"
        );
    }
    tables::write_quality(output, &quality)
}

#[tracing::instrument(skip(config), fields(input = %input.display()))]
fn run_visits(input: &Path, output: &Path, config: &RunConfig) -> Result<()> {
    let records = load_for_analysis(input, config)?;

    let options = AggregateOptions {
        excluded_destinations: config.excluded_destinations.clone(),
        top_n: 0,
    };
    let report = aggregate_period(&records, Period::Day, &options);

    tables::write_visits(output, &report)?;
    info!(output = %output.display(), "Visit counts written");
    Ok(())
}

#[tracing::instrument(fields(input = %input.display()))]
fn run_clean(input: &Path, output: &Path) -> Result<()> {
    let (records, report) = load_trips(input)?;
    tables::write_cleaned(output, &records)?;

    info!(
        rows_kept = report.rows_kept,
        rows_dropped = report.rows_dropped,
        output = %output.display(),
        "Cleaned table written"
    );
    Ok(())
}
