//! Fuel-economy reference data and its join onto trip records.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analyzers::period::Period;
use crate::analyzers::utility::mean;
use crate::model::TripRecord;

/// Static per-vehicle fuel-economy reference record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelReference {
    #[serde(rename = "Vehicle")]
    pub vehicle: String,
    #[serde(rename = "Distance")]
    pub distance: f64,
    #[serde(rename = "Fuel Used")]
    pub fuel_used: f64,
    #[serde(rename = "Fuel Economy")]
    pub economy: f64,
}

/// Loads the reference table from a CSV file.
pub fn load_references(path: &Path) -> Result<Vec<FuelReference>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open fuel reference file {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    let references = reader
        .deserialize()
        .collect::<Result<Vec<FuelReference>, _>>()
        .with_context(|| format!("malformed fuel reference row in {}", path.display()))?;

    info!(vehicles = references.len(), "Fuel reference data loaded");
    Ok(references)
}

/// Left join by vehicle identifier: every trip is retained, with `None`
/// where no reference row matches.
pub fn join_references<'a>(
    records: &'a [TripRecord],
    references: &'a [FuelReference],
) -> Vec<(&'a TripRecord, Option<&'a FuelReference>)> {
    records
        .iter()
        .map(|record| {
            let reference = references.iter().find(|r| r.vehicle == record.vehicle);
            (record, reference)
        })
        .collect()
}

/// Distance and fuel totals for one vehicle.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleFuelTotals {
    pub vehicle: String,
    /// Sum of per-trip odometer spans; trips missing a reading contribute
    /// nothing.
    pub distance_covered: f64,
    pub fuel_used: Option<f64>,
    pub fuel_economy: Option<f64>,
}

/// Per-vehicle distance/fuel totals over the joined rows, ordered by
/// vehicle.
pub fn vehicle_totals(
    joined: &[(&TripRecord, Option<&FuelReference>)],
) -> Vec<VehicleFuelTotals> {
    let mut by_vehicle: BTreeMap<&str, (f64, Option<&FuelReference>)> = BTreeMap::new();

    for (record, reference) in joined {
        let entry = by_vehicle
            .entry(record.vehicle.as_str())
            .or_insert((0.0, *reference));
        if let Some(distance) = record.distance_covered() {
            entry.0 += distance;
        }
    }

    by_vehicle
        .into_iter()
        .map(|(vehicle, (distance_covered, reference))| VehicleFuelTotals {
            vehicle: vehicle.to_string(),
            distance_covered,
            fuel_used: reference.map(|r| r.fuel_used),
            fuel_economy: reference.map(|r| r.economy),
        })
        .collect()
}

/// Mean fuel economy per (vehicle, month), for trend reporting. Months
/// follow a vehicle's trip activity; rows without a reference match are
/// skipped.
pub fn monthly_economy_trend(
    joined: &[(&TripRecord, Option<&FuelReference>)],
) -> BTreeMap<(String, NaiveDate), f64> {
    let mut samples: BTreeMap<(String, NaiveDate), Vec<f64>> = BTreeMap::new();

    for (record, reference) in joined {
        if let Some(reference) = reference {
            let month = Period::Month.bucket_start(record.trip_started.date());
            samples
                .entry((record.vehicle.clone(), month))
                .or_default()
                .push(reference.economy);
        }
    }

    samples
        .into_iter()
        .map(|(key, values)| (key, mean(&values)))
        .collect()
}
