//! Run configuration.
//!
//! Stored as a plain JSON object on disk; every field has a default, so a
//! partial file (or none at all) still yields a usable configuration:
//! ```json
//! {
//!   "vehicles": ["14A", "38A", "46", "47", "51"],
//!   "work_hours": { "start": 9, "end": 17 },
//!   "negative_delta_policy": "clamp_to_zero"
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::odometer::NegativeDeltaPolicy;
use crate::analyzers::period::Period;

/// Inclusive start hour and exclusive end hour of the working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkHours {
    pub start: u32,
    pub end: u32,
}

impl Default for WorkHours {
    fn default() -> Self {
        WorkHours { start: 9, end: 17 }
    }
}

impl WorkHours {
    pub fn contains(&self, hour: u32) -> bool {
        (self.start..self.end).contains(&hour)
    }
}

/// Destination-ranking sizes per granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopN {
    pub daily: usize,
    pub weekly: usize,
    pub monthly: usize,
    pub yearly: usize,
}

impl Default for TopN {
    fn default() -> Self {
        TopN {
            daily: 3,
            weekly: 5,
            monthly: 10,
            yearly: 10,
        }
    }
}

impl TopN {
    pub fn for_period(&self, period: Period) -> usize {
        match period {
            Period::Day => self.daily,
            Period::Week => self.weekly,
            Period::Month => self.monthly,
            Period::Year => self.yearly,
        }
    }
}

/// Configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Vehicles to analyze; empty means every vehicle in the input.
    pub vehicles: Vec<String>,
    pub work_hours: WorkHours,
    pub top_n: TopN,
    /// Destination values that mark non-visit rows.
    pub excluded_destinations: HashSet<String>,
    pub negative_delta_policy: NegativeDeltaPolicy,
    /// Optional CSV with per-vehicle fuel-economy reference data.
    pub fuel_reference: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            vehicles: Vec::new(),
            work_hours: WorkHours::default(),
            top_n: TopN::default(),
            excluded_destinations: default_excluded_destinations(),
            negative_delta_policy: NegativeDeltaPolicy::default(),
            fuel_reference: None,
        }
    }
}

fn default_excluded_destinations() -> HashSet<String> {
    [
        "DOCK",
        "Mileage",
        "Start of Day",
        "End of Day",
        "Total for Day",
        "Truck Washed",
        ".",
        "",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

impl RunConfig {
    /// Loads the config from a JSON file; `None` yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).with_context(|| {
                    format!("failed to read config file {}", path.display())
                })?;
                let config: RunConfig = serde_json::from_str(&content)
                    .with_context(|| format!("invalid config file {}", path.display()))?;
                debug!(path = %path.display(), "Config loaded");
                Ok(config)
            }
            None => Ok(RunConfig::default()),
        }
    }

    /// Whether `vehicle` passes the configured filter.
    pub fn retains(&self, vehicle: &str) -> bool {
        self.vehicles.is_empty() || self.vehicles.iter().any(|v| v == vehicle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.work_hours, WorkHours { start: 9, end: 17 });
        assert_eq!(config.top_n.for_period(Period::Day), 3);
        assert_eq!(config.top_n.for_period(Period::Week), 5);
        assert_eq!(config.top_n.for_period(Period::Month), 10);
        assert!(config.excluded_destinations.contains("DOCK"));
        assert!(config.excluded_destinations.contains(""));
        assert_eq!(config.negative_delta_policy, NegativeDeltaPolicy::Preserve);
    }

    #[test]
    fn test_work_hours_window() {
        let hours = WorkHours::default();
        assert!(hours.contains(9));
        assert!(hours.contains(16));
        assert!(!hours.contains(17));
        assert!(!hours.contains(8));
    }

    #[test]
    fn test_vehicle_filter() {
        let mut config = RunConfig::default();
        assert!(config.retains("anything"));

        config.vehicles = vec!["14A".to_string()];
        assert!(config.retains("14A"));
        assert!(!config.retains("46"));
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let path = std::env::temp_dir().join("fleet_config_partial.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{"negative_delta_policy": "clamp_to_zero", "vehicles": ["46"]}"#)
            .unwrap();

        let config = RunConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.negative_delta_policy, NegativeDeltaPolicy::ClampToZero);
        assert_eq!(config.vehicles, vec!["46".to_string()]);
        assert_eq!(config.work_hours, WorkHours::default());
        assert!(config.excluded_destinations.contains("DOCK"));
    }

    #[test]
    fn test_load_missing_path_is_default() {
        let config = RunConfig::load(None).unwrap();
        assert!(config.vehicles.is_empty());
    }
}
