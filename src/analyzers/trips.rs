//! Fleet-level descriptive statistics: trip frequency, duration spread,
//! hour-of-day activity, work-hours utilization, location modes.

use std::collections::BTreeMap;

use chrono::Timelike;
use serde::Serialize;

use crate::analyzers::aggregate::rank_by_frequency;
use crate::analyzers::utility::{mean, median, round_to};
use crate::config::WorkHours;
use crate::model::TripRecord;

/// Fleet-wide trip statistics for one run.
#[derive(Debug, Clone, Serialize)]
pub struct FleetSummary {
    /// Vehicles by descending trip count, ties by first occurrence.
    pub trips_per_vehicle: Vec<(String, usize)>,
    pub average_driving_minutes: f64,
    pub median_driving_minutes: f64,
    /// Trips starting in each hour of day, index 0-23.
    pub start_hours: [usize; 24],
    /// Trips ending in each hour of day, index 0-23. Rows without an end
    /// timestamp do not contribute.
    pub end_hours: [usize; 24],
    /// Proportion of trips starting inside the work-hours window.
    pub started_in_work_hours: f64,
    /// Proportion of trips (with an end timestamp) ending inside the window.
    pub ended_in_work_hours: f64,
}

pub fn summarize(records: &[TripRecord], work_hours: WorkHours) -> FleetSummary {
    let driving: Vec<f64> = records
        .iter()
        .map(|r| r.driving_duration.minutes())
        .collect();

    let mut start_hours = [0usize; 24];
    let mut end_hours = [0usize; 24];
    let mut started_in_window = 0usize;
    let mut ended_in_window = 0usize;
    let mut ended_total = 0usize;

    for record in records {
        let start_hour = record.trip_started.hour();
        start_hours[start_hour as usize] += 1;
        if work_hours.contains(start_hour) {
            started_in_window += 1;
        }

        if let Some(ended) = record.trip_ended {
            ended_total += 1;
            end_hours[ended.hour() as usize] += 1;
            if work_hours.contains(ended.hour()) {
                ended_in_window += 1;
            }
        }
    }

    FleetSummary {
        trips_per_vehicle: rank_by_frequency(
            records.iter().map(|r| r.vehicle.as_str()),
            usize::MAX,
        ),
        average_driving_minutes: mean(&driving),
        median_driving_minutes: median(&driving),
        start_hours,
        end_hours,
        started_in_work_hours: proportion(started_in_window, records.len()),
        ended_in_work_hours: proportion(ended_in_window, ended_total),
    }
}

fn proportion(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Most common start and end location for one vehicle.
#[derive(Debug, Clone, Serialize)]
pub struct LocationModes {
    pub vehicle: String,
    pub most_common_start: String,
    pub most_common_end: String,
}

/// Per-vehicle location modes, ordered by vehicle. Ties resolve to the
/// first-seen location.
pub fn common_locations(records: &[TripRecord]) -> Vec<LocationModes> {
    let mut by_vehicle: BTreeMap<&str, (Vec<&str>, Vec<&str>)> = BTreeMap::new();

    for record in records {
        let entry = by_vehicle.entry(record.vehicle.as_str()).or_default();
        entry.0.push(record.start_location.as_str());
        entry.1.push(record.end_location.as_str());
    }

    by_vehicle
        .into_iter()
        .map(|(vehicle, (starts, ends))| LocationModes {
            vehicle: vehicle.to_string(),
            most_common_start: mode(starts),
            most_common_end: mode(ends),
        })
        .collect()
}

fn mode(values: Vec<&str>) -> String {
    rank_by_frequency(values, 1)
        .into_iter()
        .next()
        .map(|(value, _)| value)
        .unwrap_or_default()
}

/// Trip durations rounded to the nearest `step_minutes`, with counts,
/// ordered by descending count then bin. Rows without an end timestamp are
/// skipped.
pub fn duration_distribution(records: &[TripRecord], step_minutes: f64) -> Vec<(f64, usize)> {
    let mut bins: BTreeMap<i64, usize> = BTreeMap::new();

    for record in records {
        if let Some(minutes) = record.trip_minutes() {
            let bin = (minutes / step_minutes).round() as i64;
            *bins.entry(bin).or_default() += 1;
        }
    }

    let mut distribution: Vec<(i64, usize)> = bins.into_iter().collect();
    distribution.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    distribution
        .into_iter()
        .map(|(bin, count)| (round_to(bin as f64 * step_minutes, step_minutes), count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::parse_minutes;
    use chrono::NaiveDate;

    fn record(vehicle: &str, start_hour: u32, minutes: i64, driving: Option<&str>) -> TripRecord {
        let started = NaiveDate::from_ymd_opt(2023, 11, 6)
            .unwrap()
            .and_hms_opt(start_hour, 0, 0)
            .unwrap();
        TripRecord {
            vehicle: vehicle.to_string(),
            trip_started: started,
            trip_ended: Some(started + chrono::Duration::minutes(minutes)),
            start_odometer: None,
            end_odometer: None,
            stop_duration: parse_minutes(None),
            driving_duration: parse_minutes(driving),
            idling_duration: parse_minutes(None),
            start_location: "DOCK".to_string(),
            end_location: "Main St".to_string(),
            maximum_speed: None,
        }
    }

    #[test]
    fn test_summarize_counts_and_proportions() {
        let records = vec![
            record("14A", 8, 30, Some("00:30:00")),
            record("14A", 10, 60, Some("01:00:00")),
            record("46", 16, 90, Some("00:45:00")),
        ];
        let summary = summarize(&records, WorkHours::default());

        assert_eq!(
            summary.trips_per_vehicle,
            vec![("14A".to_string(), 2), ("46".to_string(), 1)]
        );
        assert!((summary.average_driving_minutes - 45.0).abs() < 1e-9);
        assert!((summary.median_driving_minutes - 45.0).abs() < 1e-9);
        assert_eq!(summary.start_hours[8], 1);
        assert_eq!(summary.start_hours[10], 1);
        assert_eq!(summary.start_hours[16], 1);
        // 10:00 and 16:00 are inside 9-17; 08:00 is not.
        assert!((summary.started_in_work_hours - 2.0 / 3.0).abs() < 1e-9);
        // Ends at 08:30, 11:00, 17:30; only 11:00 is inside.
        assert!((summary.ended_in_work_hours - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], WorkHours::default());
        assert!(summary.trips_per_vehicle.is_empty());
        assert_eq!(summary.started_in_work_hours, 0.0);
    }

    #[test]
    fn test_common_locations_mode() {
        let mut a = record("14A", 9, 30, None);
        a.end_location = "Elm Ave".to_string();
        let records = vec![
            a,
            record("14A", 10, 30, None),
            record("14A", 11, 30, None),
        ];
        let modes = common_locations(&records);
        assert_eq!(modes.len(), 1);
        assert_eq!(modes[0].most_common_start, "DOCK");
        assert_eq!(modes[0].most_common_end, "Main St");
    }

    #[test]
    fn test_duration_distribution_bins() {
        let records = vec![
            record("14A", 9, 28, None),
            record("14A", 10, 31, None),
            record("14A", 11, 47, None),
        ];
        // 28 and 31 both round to 30; 47 rounds to 45.
        let distribution = duration_distribution(&records, 5.0);
        assert_eq!(distribution, vec![(30.0, 2), (45.0, 1)]);
    }
}
