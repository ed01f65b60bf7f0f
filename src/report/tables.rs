//! CSV table output.
//!
//! Per-vehicle tables live in a `vehicle=<id>/` directory each, mirroring
//! the one-sheet-per-vehicle layout of the source workbooks; fleet-level
//! tables sit at the output root.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::aggregate::PeriodReport;
use crate::analyzers::fuel::VehicleFuelTotals;
use crate::analyzers::odometer::DeltaSummary;
use crate::analyzers::period::Period;
use crate::analyzers::quality::ColumnQuality;
use crate::analyzers::trips::{FleetSummary, LocationModes};
use crate::model::{CleanedRow, TripRecord};

/// Directory holding one vehicle's tables.
pub fn vehicle_dir(out_dir: &Path, vehicle: &str) -> PathBuf {
    out_dir.join(format!("vehicle={vehicle}"))
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), "Table written");
    Ok(())
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    bucket: &'a str,
    visits: usize,
    unique_destinations: usize,
    driving_hours: f64,
    distance_covered: f64,
}

/// Writes `summary_<period>.csv` for every vehicle in the report.
pub fn write_period_summaries(
    out_dir: &Path,
    period: Period,
    report: &PeriodReport,
) -> Result<()> {
    for (vehicle, series) in &report.series {
        let path = vehicle_dir(out_dir, vehicle).join(format!("summary_{}.csv", period.slug()));
        let labeled: Vec<(String, _)> = series
            .iter()
            .map(|(bucket, summary)| (period.label(*bucket), summary))
            .collect();
        write_rows(
            &path,
            labeled.iter().map(|(label, summary)| SummaryRow {
                bucket: label,
                visits: summary.visits,
                unique_destinations: summary.unique_destinations,
                driving_hours: summary.driving_hours,
                distance_covered: summary.distance_covered,
            }),
        )?;
    }
    Ok(())
}

#[derive(Serialize)]
struct TopLocationRow<'a> {
    bucket: &'a str,
    rank: usize,
    destination: &'a str,
    visits: usize,
}

/// Writes `top_locations_<period>.csv` for every vehicle in the report.
pub fn write_top_locations(out_dir: &Path, period: Period, report: &PeriodReport) -> Result<()> {
    for (vehicle, buckets) in &report.rankings {
        let path =
            vehicle_dir(out_dir, vehicle).join(format!("top_locations_{}.csv", period.slug()));

        let mut rows = Vec::new();
        for (bucket, ranking) in buckets {
            let label = period.label(*bucket);
            for (rank, (destination, visits)) in ranking.iter().enumerate() {
                rows.push((label.clone(), rank + 1, destination.clone(), *visits));
            }
        }
        write_rows(
            &path,
            rows.iter().map(|(bucket, rank, destination, visits)| TopLocationRow {
                bucket,
                rank: *rank,
                destination,
                visits: *visits,
            }),
        )?;
    }
    Ok(())
}

/// Fleet-level `quality.csv`: one row per input column.
pub fn write_quality(out_dir: &Path, quality: &[ColumnQuality]) -> Result<()> {
    write_rows(&out_dir.join("quality.csv"), quality)
}

/// Rows flagged by the outlier scan, as `outliers_<column>.csv`.
pub fn write_outliers(
    out_dir: &Path,
    column: &str,
    records: &[TripRecord],
    flagged: &[usize],
) -> Result<()> {
    let file_name = format!("outliers_{}.csv", column.replace(' ', "_"));
    write_rows(
        &out_dir.join(file_name),
        flagged.iter().map(|&index| CleanedRow::from(&records[index])),
    )
}

/// Per-vehicle odometer-delta statistics, as `odometer_deltas.csv`.
pub fn write_delta_summaries(out_dir: &Path, summaries: &[DeltaSummary]) -> Result<()> {
    write_rows(&out_dir.join("odometer_deltas.csv"), summaries)
}

#[derive(Serialize)]
struct MetricRow<'a> {
    metric: &'a str,
    value: f64,
}

#[derive(Serialize)]
struct HourRow {
    hour: u32,
    trips_started: usize,
    trips_ended: usize,
}

#[derive(Serialize)]
struct FrequencyRow<'a> {
    vehicle: &'a str,
    trips: usize,
}

#[derive(Serialize)]
struct DurationBinRow {
    minutes: f64,
    trips: usize,
}

/// Fleet-level descriptive tables: overview metrics, per-vehicle trip
/// frequency, hour-of-day activity, and the rounded-duration distribution.
pub fn write_fleet_summary(
    out_dir: &Path,
    summary: &FleetSummary,
    durations: &[(f64, usize)],
) -> Result<()> {
    write_rows(
        &out_dir.join("fleet_overview.csv"),
        [
            MetricRow {
                metric: "average_driving_minutes",
                value: summary.average_driving_minutes,
            },
            MetricRow {
                metric: "median_driving_minutes",
                value: summary.median_driving_minutes,
            },
            MetricRow {
                metric: "started_in_work_hours",
                value: summary.started_in_work_hours,
            },
            MetricRow {
                metric: "ended_in_work_hours",
                value: summary.ended_in_work_hours,
            },
        ],
    )?;

    write_rows(
        &out_dir.join("trip_frequency.csv"),
        summary
            .trips_per_vehicle
            .iter()
            .map(|(vehicle, trips)| FrequencyRow {
                vehicle,
                trips: *trips,
            }),
    )?;

    write_rows(
        &out_dir.join("hourly_activity.csv"),
        (0..24).map(|hour| HourRow {
            hour: hour as u32,
            trips_started: summary.start_hours[hour],
            trips_ended: summary.end_hours[hour],
        }),
    )?;

    write_rows(
        &out_dir.join("duration_distribution.csv"),
        durations.iter().map(|(minutes, trips)| DurationBinRow {
            minutes: *minutes,
            trips: *trips,
        }),
    )
}

/// Per-vehicle location modes, as `common_locations.csv`.
pub fn write_common_locations(out_dir: &Path, modes: &[LocationModes]) -> Result<()> {
    write_rows(&out_dir.join("common_locations.csv"), modes)
}

/// Per-vehicle fuel totals, as `fuel_totals.csv`.
pub fn write_fuel_totals(out_dir: &Path, totals: &[VehicleFuelTotals]) -> Result<()> {
    write_rows(&out_dir.join("fuel_totals.csv"), totals)
}

#[derive(Serialize)]
struct FuelTrendRow<'a> {
    vehicle: &'a str,
    month: String,
    fuel_economy: f64,
}

/// Monthly mean fuel economy per vehicle, as `fuel_economy_monthly.csv`.
pub fn write_fuel_trend(
    out_dir: &Path,
    trend: &BTreeMap<(String, NaiveDate), f64>,
) -> Result<()> {
    write_rows(
        &out_dir.join("fuel_economy_monthly.csv"),
        trend.iter().map(|((vehicle, month), economy)| FuelTrendRow {
            vehicle,
            month: Period::Month.label(*month),
            fuel_economy: *economy,
        }),
    )
}

#[derive(Serialize)]
struct VisitRow<'a> {
    date: String,
    vehicle: &'a str,
    total_visits: usize,
    unique_visits: usize,
}

/// Per-day visit counts per vehicle, flattened from a daily report.
pub fn write_visits(path: &Path, report: &PeriodReport) -> Result<()> {
    let mut rows = Vec::new();
    for (vehicle, series) in &report.series {
        for (bucket, summary) in series {
            rows.push(VisitRow {
                date: Period::Day.label(*bucket),
                vehicle,
                total_visits: summary.visits,
                unique_visits: summary.unique_destinations,
            });
        }
    }
    write_rows(path, rows)
}

/// Normalized copy of the input, for the `clean` subcommand.
pub fn write_cleaned(path: &Path, records: &[TripRecord]) -> Result<()> {
    write_rows(path, records.iter().map(CleanedRow::from))
}
