//! Per-(vehicle, bucket) aggregation.
//!
//! One parameterized path covers all four calendar granularities: group by
//! vehicle and bucket, count visits, count distinct destinations, sum
//! driving time and distance, rank destinations, zero-fill the series.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::analyzers::period::Period;
use crate::model::TripRecord;

/// Knobs for one aggregation run.
#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Destinations that are placeholders, not visits (depot markers,
    /// summary rows). Excluded from unique counts and rankings.
    pub excluded_destinations: HashSet<String>,
    /// Ranking size for this granularity.
    pub top_n: usize,
}

/// Aggregate for one (vehicle, bucket) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BucketSummary {
    pub visits: usize,
    pub unique_destinations: usize,
    pub driving_hours: f64,
    pub distance_covered: f64,
}

/// Full aggregate output for one granularity.
///
/// `series` holds, per vehicle, an ascending bucket series with every
/// bucket between the vehicle's first and last activity present; gaps carry
/// zero-valued aggregates so downstream chart series stay uniform.
/// `rankings` holds only buckets that had rankable visits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodReport {
    pub series: BTreeMap<String, Vec<(NaiveDate, BucketSummary)>>,
    pub rankings: BTreeMap<String, Vec<(NaiveDate, Vec<(String, usize)>)>>,
}

/// Ranks values by descending frequency, ties broken by first occurrence,
/// truncated to `n`.
pub fn rank_by_frequency<'a, I>(values: I, n: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for value in values {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value.to_string(), counts.len());
                counts.push((value.to_string(), 1));
            }
        }
    }

    // Stable sort keeps first-seen order within equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}

impl PeriodReport {
    /// One vehicle's destination ranking combined across its buckets, for
    /// chart rendering. Ties keep the order of first appearance in the
    /// bucket series.
    pub fn overall_ranking(&self, vehicle: &str, n: usize) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut index: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

        if let Some(buckets) = self.rankings.get(vehicle) {
            for (_, ranking) in buckets {
                for (destination, visits) in ranking {
                    match index.get(destination) {
                        Some(&i) => counts[i].1 += visits,
                        None => {
                            index.insert(destination.clone(), counts.len());
                            counts.push((destination.clone(), *visits));
                        }
                    }
                }
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(n);
        counts
    }
}

#[derive(Default)]
struct Accum<'a> {
    visits: usize,
    driving_minutes: f64,
    distance: f64,
    destinations: Vec<&'a str>,
}

/// Aggregates trips into per-(vehicle, bucket) summaries for one
/// granularity. Records are expected in (vehicle, start timestamp) order;
/// the result is deterministic given identical input ordering.
pub fn aggregate_period(
    records: &[TripRecord],
    period: Period,
    options: &AggregateOptions,
) -> PeriodReport {
    let mut buckets: BTreeMap<&str, BTreeMap<NaiveDate, Accum>> = BTreeMap::new();

    for record in records {
        let bucket = period.bucket_start(record.trip_started.date());
        let accum = buckets
            .entry(record.vehicle.as_str())
            .or_default()
            .entry(bucket)
            .or_default();

        accum.visits += 1;
        accum.driving_minutes += record.driving_duration.minutes();
        if let Some(distance) = record.distance_covered() {
            accum.distance += distance;
        }
        if !options
            .excluded_destinations
            .contains(record.end_location.as_str())
        {
            accum.destinations.push(record.end_location.as_str());
        }
    }

    let mut report = PeriodReport::default();

    for (vehicle, vehicle_buckets) in buckets {
        // Non-empty by construction: a vehicle only appears with a bucket.
        let first = *vehicle_buckets.keys().next().unwrap();
        let last = *vehicle_buckets.keys().next_back().unwrap();

        let mut series = Vec::new();
        let mut rankings = Vec::new();
        let mut cursor = first;
        while cursor <= last {
            match vehicle_buckets.get(&cursor) {
                Some(accum) => {
                    let full = rank_by_frequency(accum.destinations.iter().copied(), usize::MAX);
                    let unique_destinations = full.len();
                    let mut ranking = full;
                    ranking.truncate(options.top_n);

                    series.push((
                        cursor,
                        BucketSummary {
                            visits: accum.visits,
                            unique_destinations,
                            driving_hours: accum.driving_minutes / 60.0,
                            distance_covered: accum.distance,
                        },
                    ));
                    if !ranking.is_empty() {
                        rankings.push((cursor, ranking));
                    }
                }
                None => series.push((cursor, BucketSummary::default())),
            }
            cursor = period.succ(cursor);
        }

        report.series.insert(vehicle.to_string(), series);
        report.rankings.insert(vehicle.to_string(), rankings);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::parse_minutes;

    fn record(vehicle: &str, day: u32, destination: &str, driving: &str) -> TripRecord {
        TripRecord {
            vehicle: vehicle.to_string(),
            trip_started: NaiveDate::from_ymd_opt(2023, 11, day)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            trip_ended: None,
            start_odometer: Some(100.0),
            end_odometer: Some(110.0),
            stop_duration: parse_minutes(None),
            driving_duration: parse_minutes(Some(driving)),
            idling_duration: parse_minutes(None),
            start_location: "DOCK".to_string(),
            end_location: destination.to_string(),
            maximum_speed: None,
        }
    }

    fn options(top_n: usize) -> AggregateOptions {
        AggregateOptions {
            excluded_destinations: HashSet::from(["DOCK".to_string()]),
            top_n,
        }
    }

    #[test]
    fn test_rank_by_frequency_tie_break() {
        let values = ["A", "B", "A", "C", "B", "A"];
        let ranking = rank_by_frequency(values.iter().copied(), 2);
        assert_eq!(ranking, vec![("A".to_string(), 3), ("B".to_string(), 2)]);
    }

    #[test]
    fn test_rank_by_frequency_first_seen_wins_ties() {
        let values = ["B", "A", "A", "B"];
        let ranking = rank_by_frequency(values.iter().copied(), 2);
        assert_eq!(ranking, vec![("B".to_string(), 2), ("A".to_string(), 2)]);
    }

    #[test]
    fn test_daily_aggregation_counts_and_sums() {
        let records = vec![
            record("14A", 6, "Main St", "01:00:00"),
            record("14A", 6, "Main St", "00:30:00"),
            record("14A", 6, "DOCK", "00:15:00"),
        ];
        let report = aggregate_period(&records, Period::Day, &options(3));

        let series = &report.series["14A"];
        assert_eq!(series.len(), 1);
        let (_, summary) = &series[0];
        assert_eq!(summary.visits, 3);
        assert_eq!(summary.unique_destinations, 1);
        assert!((summary.driving_hours - 1.75).abs() < 1e-9);
        assert!((summary.distance_covered - 30.0).abs() < 1e-9);

        let rankings = &report.rankings["14A"];
        assert_eq!(rankings[0].1, vec![("Main St".to_string(), 2)]);
    }

    #[test]
    fn test_weekly_series_zero_fills_gap() {
        // Trips in ISO weeks 45 (Nov 6) and 47 (Nov 20), none in week 46.
        let records = vec![
            record("14A", 6, "Main St", "00:30:00"),
            record("14A", 20, "Main St", "00:30:00"),
        ];
        let report = aggregate_period(&records, Period::Week, &options(3));

        let series = &report.series["14A"];
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].0, NaiveDate::from_ymd_opt(2023, 11, 6).unwrap());
        assert_eq!(series[1].0, NaiveDate::from_ymd_opt(2023, 11, 13).unwrap());
        assert_eq!(series[1].1, BucketSummary::default());
        assert_eq!(series[2].1.visits, 1);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let records = vec![
            record("14A", 6, "Main St", "00:30:00"),
            record("46", 7, "Elm Ave", "00:45:00"),
            record("46", 9, "Main St", "00:20:00"),
        ];
        let first = aggregate_period(&records, Period::Month, &options(5));
        let second = aggregate_period(&records, Period::Month, &options(5));
        assert_eq!(first, second);
    }

    #[test]
    fn test_excluded_destinations_do_not_rank_but_still_count_visits() {
        let records = vec![
            record("14A", 6, "DOCK", "00:30:00"),
            record("14A", 6, "DOCK", "00:30:00"),
        ];
        let report = aggregate_period(&records, Period::Day, &options(3));

        let (_, summary) = &report.series["14A"][0];
        assert_eq!(summary.visits, 2);
        assert_eq!(summary.unique_destinations, 0);
        assert!(report.rankings["14A"].is_empty());
    }
}
