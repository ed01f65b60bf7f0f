//! Input loading and schema validation.
//!
//! The header is checked against the column contract before any row is
//! read, so a renamed upstream column fails the run immediately instead of
//! surfacing as a lookup failure deep in the pipeline.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::model::{RawTripRow, REQUIRED_COLUMNS, TripRecord};
use crate::normalize::{DefaultReason, MinutesValue, parse_minutes, parse_timestamp};

/// What the loader kept and what it coerced away.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Rows excluded because the start timestamp could not be parsed.
    pub rows_dropped: usize,
    /// Duration fields that held text but not a parseable duration.
    pub defaulted_durations: usize,
}

/// Loads the trip table, validating the column contract up front.
///
/// Rows with an unparseable start timestamp are dropped and counted; every
/// other parsing failure degrades to a default value on the retained row.
/// Only an unreadable file or a header mismatch is fatal.
pub fn load_trips(path: &Path) -> Result<(Vec<TripRecord>, LoadReport)> {
    let file = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    validate_header(reader.headers()?)?;

    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for result in reader.deserialize() {
        let raw: RawTripRow = result.with_context(|| {
            format!("malformed row {} in {}", report.rows_read + 1, path.display())
        })?;
        report.rows_read += 1;

        match convert_row(raw, &mut report) {
            Some(record) => {
                report.rows_kept += 1;
                records.push(record);
            }
            None => report.rows_dropped += 1,
        }
    }

    info!(
        rows_read = report.rows_read,
        rows_kept = report.rows_kept,
        rows_dropped = report.rows_dropped,
        defaulted_durations = report.defaulted_durations,
        "Trip table loaded"
    );

    Ok((records, report))
}

/// Reads the file as untyped rows, for the column-quality report. The
/// header contract is not enforced here; quality is reported for whatever
/// columns the file has.
pub fn load_raw(path: &Path) -> Result<(Vec<String>, Vec<csv::StringRecord>)> {
    let file = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader.records().collect::<Result<Vec<_>, _>>()?;

    Ok((headers, rows))
}

fn validate_header(headers: &csv::StringRecord) -> Result<()> {
    let present: Vec<&str> = headers.iter().map(str::trim).collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !present.contains(column))
        .collect();
    let unexpected: Vec<&str> = present
        .iter()
        .copied()
        .filter(|column| !REQUIRED_COLUMNS.contains(column))
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        bail!(
            "input columns do not match the expected contract; missing: [{}], unexpected: [{}]",
            missing.join(", "),
            unexpected.join(", ")
        );
    }

    Ok(())
}

fn convert_row(raw: RawTripRow, report: &mut LoadReport) -> Option<TripRecord> {
    let trip_started = match parse_timestamp(&raw.trip_started) {
        Some(ts) => ts,
        None => {
            warn!(
                vehicle = %raw.vehicle,
                raw = %raw.trip_started,
                "Dropping row with unparseable start timestamp"
            );
            return None;
        }
    };

    let stop_duration = tracked_minutes(&raw.stop_duration, "Stop Duration", &raw.vehicle, report);
    let driving_duration =
        tracked_minutes(&raw.driving_duration, "Driving Duration", &raw.vehicle, report);
    let idling_duration =
        tracked_minutes(&raw.idling_duration, "Idling Duration", &raw.vehicle, report);

    Some(TripRecord {
        vehicle: raw.vehicle.trim().to_string(),
        trip_started,
        trip_ended: parse_timestamp(&raw.trip_ended),
        start_odometer: parse_number(&raw.start_odometer),
        end_odometer: parse_number(&raw.end_odometer),
        stop_duration,
        driving_duration,
        idling_duration,
        start_location: raw.start_location.trim().to_string(),
        end_location: raw.end_location.trim().to_string(),
        maximum_speed: parse_number(&raw.maximum_speed),
    })
}

fn tracked_minutes(
    raw: &str,
    column: &str,
    vehicle: &str,
    report: &mut LoadReport,
) -> MinutesValue {
    let value = parse_minutes(Some(raw));
    if value == MinutesValue::Defaulted(DefaultReason::Unparseable) {
        report.defaulted_durations += 1;
        debug!(vehicle, column, raw, "Duration defaulted to 0 minutes");
    }
    value
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        trimmed.parse().ok()
    }
}
