//! Per-vehicle odometer differencing.
//!
//! Differencing is only meaningful on records sorted by (vehicle, start
//! timestamp); [`sort_for_analysis`] establishes that order for the whole
//! pipeline.

use serde::{Deserialize, Serialize};

use crate::analyzers::utility::{mean, stddev};
use crate::model::TripRecord;

/// How to treat a negative odometer difference.
///
/// Negative deltas surface data-quality issues (reading rollbacks, swapped
/// rows); preserving them is the default so they stay visible downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeDeltaPolicy {
    #[default]
    Preserve,
    ClampToZero,
}

/// Sorts records by (vehicle, start timestamp) ascending, in place.
/// Required before differencing or bucketed aggregation.
pub fn sort_for_analysis(records: &mut [TripRecord]) {
    records.sort_by(|a, b| {
        a.vehicle
            .cmp(&b.vehicle)
            .then(a.trip_started.cmp(&b.trip_started))
    });
}

/// End-odometer differences along each vehicle's sorted sequence, aligned
/// with the input records.
///
/// The first reading per vehicle has no predecessor and yields 0, as does a
/// record with a missing reading; a missing reading does not reset the
/// sequence, so the next delta spans the gap.
pub fn odometer_deltas(records: &[TripRecord], policy: NegativeDeltaPolicy) -> Vec<f64> {
    let mut deltas = Vec::with_capacity(records.len());
    let mut prev_vehicle: Option<&str> = None;
    let mut prev_reading: Option<f64> = None;

    for record in records {
        if prev_vehicle != Some(record.vehicle.as_str()) {
            prev_vehicle = Some(record.vehicle.as_str());
            prev_reading = None;
        }

        let raw = match (prev_reading, record.end_odometer) {
            (Some(last), Some(current)) => current - last,
            _ => 0.0,
        };
        deltas.push(match policy {
            NegativeDeltaPolicy::Preserve => raw,
            NegativeDeltaPolicy::ClampToZero => raw.max(0.0),
        });

        if record.end_odometer.is_some() {
            prev_reading = record.end_odometer;
        }
    }

    deltas
}

/// Descriptive statistics of one vehicle's odometer deltas.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaSummary {
    pub vehicle: String,
    pub trips: usize,
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-vehicle summaries of the deltas produced by [`odometer_deltas`],
/// ordered by vehicle. `deltas` must be aligned with `records`.
pub fn summarize_by_vehicle(records: &[TripRecord], deltas: &[f64]) -> Vec<DeltaSummary> {
    let mut summaries = Vec::new();
    let mut current: Option<(String, Vec<f64>)> = None;

    for (record, delta) in records.iter().zip(deltas) {
        match &mut current {
            Some((vehicle, values)) if *vehicle == record.vehicle => values.push(*delta),
            _ => {
                if let Some((vehicle, values)) = current.take() {
                    summaries.push(summary(vehicle, &values));
                }
                current = Some((record.vehicle.clone(), vec![*delta]));
            }
        }
    }
    if let Some((vehicle, values)) = current {
        summaries.push(summary(vehicle, &values));
    }

    summaries
}

fn summary(vehicle: String, values: &[f64]) -> DeltaSummary {
    DeltaSummary {
        vehicle,
        trips: values.len(),
        mean: mean(values),
        stddev: stddev(values),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::parse_minutes;
    use chrono::NaiveDate;

    fn record(vehicle: &str, day: u32, hour: u32, end_odometer: Option<f64>) -> TripRecord {
        TripRecord {
            vehicle: vehicle.to_string(),
            trip_started: NaiveDate::from_ymd_opt(2023, 11, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            trip_ended: None,
            start_odometer: None,
            end_odometer,
            stop_duration: parse_minutes(None),
            driving_duration: parse_minutes(None),
            idling_duration: parse_minutes(None),
            start_location: String::new(),
            end_location: String::new(),
            maximum_speed: None,
        }
    }

    #[test]
    fn test_deltas_preserve_negative() {
        let records = vec![
            record("14A", 1, 8, Some(100.0)),
            record("14A", 1, 10, Some(150.0)),
            record("14A", 2, 8, Some(140.0)),
            record("14A", 2, 10, Some(200.0)),
        ];
        let deltas = odometer_deltas(&records, NegativeDeltaPolicy::Preserve);
        assert_eq!(deltas, vec![0.0, 50.0, -10.0, 60.0]);
    }

    #[test]
    fn test_deltas_clamped() {
        let records = vec![
            record("14A", 1, 8, Some(100.0)),
            record("14A", 1, 10, Some(150.0)),
            record("14A", 2, 8, Some(140.0)),
            record("14A", 2, 10, Some(200.0)),
        ];
        let deltas = odometer_deltas(&records, NegativeDeltaPolicy::ClampToZero);
        assert_eq!(deltas, vec![0.0, 50.0, 0.0, 60.0]);
    }

    #[test]
    fn test_first_delta_per_vehicle_is_zero() {
        let records = vec![
            record("14A", 1, 8, Some(100.0)),
            record("14A", 1, 10, Some(150.0)),
            record("46", 1, 8, Some(800.0)),
            record("46", 1, 10, Some(830.0)),
        ];
        let deltas = odometer_deltas(&records, NegativeDeltaPolicy::Preserve);
        assert_eq!(deltas, vec![0.0, 50.0, 0.0, 30.0]);
    }

    #[test]
    fn test_missing_reading_spans_gap() {
        let records = vec![
            record("14A", 1, 8, Some(100.0)),
            record("14A", 1, 10, None),
            record("14A", 1, 12, Some(130.0)),
        ];
        let deltas = odometer_deltas(&records, NegativeDeltaPolicy::Preserve);
        assert_eq!(deltas, vec![0.0, 0.0, 30.0]);
    }

    #[test]
    fn test_sort_orders_by_vehicle_then_start() {
        let mut records = vec![
            record("46", 1, 8, None),
            record("14A", 2, 8, None),
            record("14A", 1, 8, None),
        ];
        sort_for_analysis(&mut records);
        let order: Vec<(String, u32)> = records
            .iter()
            .map(|r| (r.vehicle.clone(), chrono::Datelike::day(&r.trip_started.date())))
            .collect();
        assert_eq!(
            order,
            vec![
                ("14A".to_string(), 1),
                ("14A".to_string(), 2),
                ("46".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_summaries_group_by_vehicle() {
        let records = vec![
            record("14A", 1, 8, Some(100.0)),
            record("14A", 1, 10, Some(150.0)),
            record("46", 1, 8, Some(800.0)),
        ];
        let deltas = odometer_deltas(&records, NegativeDeltaPolicy::Preserve);
        let summaries = summarize_by_vehicle(&records, &deltas);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].vehicle, "14A");
        assert_eq!(summaries[0].trips, 2);
        assert_eq!(summaries[0].max, 50.0);
        assert_eq!(summaries[1].vehicle, "46");
        assert_eq!(summaries[1].trips, 1);
    }
}
