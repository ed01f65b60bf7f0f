//! Record types and the input column contract.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::normalize::MinutesValue;

/// The fixed input column contract, case- and spacing-sensitive.
///
/// Any rename in the upstream export must be reflected here; the loader
/// rejects files whose header does not match exactly.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Vehicle",
    "Trip Started",
    "Trip Ended",
    "Start Odometer",
    "End Odometer",
    "Stop Duration",
    "Driving Duration",
    "Idling Duration",
    "Start Location",
    "End Location",
    "Maximum Speed",
];

/// One row exactly as it appears in the input file, before any coercion.
#[derive(Debug, Deserialize)]
pub struct RawTripRow {
    #[serde(rename = "Vehicle")]
    pub vehicle: String,
    #[serde(rename = "Trip Started")]
    pub trip_started: String,
    #[serde(rename = "Trip Ended")]
    pub trip_ended: String,
    #[serde(rename = "Start Odometer")]
    pub start_odometer: String,
    #[serde(rename = "End Odometer")]
    pub end_odometer: String,
    #[serde(rename = "Stop Duration")]
    pub stop_duration: String,
    #[serde(rename = "Driving Duration")]
    pub driving_duration: String,
    #[serde(rename = "Idling Duration")]
    pub idling_duration: String,
    #[serde(rename = "Start Location")]
    pub start_location: String,
    #[serde(rename = "End Location")]
    pub end_location: String,
    #[serde(rename = "Maximum Speed")]
    pub maximum_speed: String,
}

/// One vehicle movement event with normalized fields.
///
/// Numeric fields that failed coercion are `None`: excluded from sums and
/// means, still present for row counts.
#[derive(Debug, Clone)]
pub struct TripRecord {
    pub vehicle: String,
    pub trip_started: NaiveDateTime,
    pub trip_ended: Option<NaiveDateTime>,
    pub start_odometer: Option<f64>,
    pub end_odometer: Option<f64>,
    pub stop_duration: MinutesValue,
    pub driving_duration: MinutesValue,
    pub idling_duration: MinutesValue,
    pub start_location: String,
    pub end_location: String,
    pub maximum_speed: Option<f64>,
}

impl TripRecord {
    /// Wall-clock trip length in minutes, from the start/end timestamps.
    pub fn trip_minutes(&self) -> Option<f64> {
        self.trip_ended
            .map(|end| (end - self.trip_started).num_seconds() as f64 / 60.0)
    }

    /// Driving plus idling time in minutes.
    pub fn total_duration_minutes(&self) -> f64 {
        self.driving_duration.minutes() + self.idling_duration.minutes()
    }

    /// Odometer span of this single trip, when both readings are present.
    pub fn distance_covered(&self) -> Option<f64> {
        match (self.start_odometer, self.end_odometer) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Numeric view of a column by its contract name, for outlier scans.
    ///
    /// Durations are exposed in minutes; `Trip Duration` is derived from the
    /// timestamps. Returns `Err` for columns that are not numeric.
    pub fn numeric_field(&self, column: &str) -> Result<Option<f64>, UnknownColumn> {
        let value = match column {
            "Start Odometer" => self.start_odometer,
            "End Odometer" => self.end_odometer,
            "Maximum Speed" => self.maximum_speed,
            "Stop Duration" => Some(self.stop_duration.minutes()),
            "Driving Duration" => Some(self.driving_duration.minutes()),
            "Idling Duration" => Some(self.idling_duration.minutes()),
            "Trip Duration" => self.trip_minutes(),
            _ => return Err(UnknownColumn),
        };
        Ok(value)
    }
}

/// Columns accepted by [`TripRecord::numeric_field`].
pub const NUMERIC_COLUMNS: &[&str] = &[
    "Start Odometer",
    "End Odometer",
    "Maximum Speed",
    "Stop Duration",
    "Driving Duration",
    "Idling Duration",
    "Trip Duration",
];

/// Marker error for a column name outside [`NUMERIC_COLUMNS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownColumn;

/// A normalized row ready for CSV output: canonical timestamps, durations
/// in fractional minutes. Used by the `clean` subcommand and outlier
/// listings.
#[derive(Debug, Serialize)]
pub struct CleanedRow {
    #[serde(rename = "Vehicle")]
    pub vehicle: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Trip Started")]
    pub trip_started: String,
    #[serde(rename = "Trip Ended")]
    pub trip_ended: String,
    #[serde(rename = "Start Odometer")]
    pub start_odometer: Option<f64>,
    #[serde(rename = "End Odometer")]
    pub end_odometer: Option<f64>,
    #[serde(rename = "Stop Duration (Minutes)")]
    pub stop_minutes: f64,
    #[serde(rename = "Driving Duration (Minutes)")]
    pub driving_minutes: f64,
    #[serde(rename = "Idling Duration (Minutes)")]
    pub idling_minutes: f64,
    #[serde(rename = "Start Location")]
    pub start_location: String,
    #[serde(rename = "End Location")]
    pub end_location: String,
    #[serde(rename = "Maximum Speed")]
    pub maximum_speed: Option<f64>,
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl From<&TripRecord> for CleanedRow {
    fn from(record: &TripRecord) -> Self {
        CleanedRow {
            vehicle: record.vehicle.clone(),
            date: record.trip_started.date().format("%Y-%m-%d").to_string(),
            trip_started: record.trip_started.format(TIMESTAMP_FORMAT).to_string(),
            trip_ended: record
                .trip_ended
                .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
            start_odometer: record.start_odometer,
            end_odometer: record.end_odometer,
            stop_minutes: record.stop_duration.minutes(),
            driving_minutes: record.driving_duration.minutes(),
            idling_minutes: record.idling_duration.minutes(),
            start_location: record.start_location.clone(),
            end_location: record.end_location.clone(),
            maximum_speed: record.maximum_speed,
        }
    }
}
