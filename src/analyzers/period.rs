//! Calendar bucketing strategies.
//!
//! One [`Period`] value parameterizes the whole aggregation path, so daily,
//! weekly, monthly, and yearly tables share the same tie-breaking and
//! zero-filling rules.

use chrono::{Datelike, Duration, NaiveDate};

/// Calendar granularity for grouped aggregation. Weeks start on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Day, Period::Week, Period::Month, Period::Year];

    /// First day of the bucket containing `date`. This canonical date is
    /// the bucket key everywhere downstream.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Day => date,
            Period::Week => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            // Day 1 exists in every month, so these cannot fail.
            Period::Month => date.with_day(1).unwrap(),
            Period::Year => date.with_day(1).unwrap().with_month(1).unwrap(),
        }
    }

    /// First day of the bucket after the one starting at `start`.
    pub fn succ(&self, start: NaiveDate) -> NaiveDate {
        match self {
            Period::Day => start + Duration::days(1),
            Period::Week => start + Duration::days(7),
            Period::Month => {
                let (year, month) = if start.month() == 12 {
                    (start.year() + 1, 1)
                } else {
                    (start.year(), start.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1).unwrap()
            }
            Period::Year => NaiveDate::from_ymd_opt(start.year() + 1, 1, 1).unwrap(),
        }
    }

    /// Bucket label for tables: `2023-11-07`, `2023-W45`, `2023-11`, `2023`.
    pub fn label(&self, start: NaiveDate) -> String {
        match self {
            Period::Day => start.format("%Y-%m-%d").to_string(),
            Period::Week => {
                let iso = start.iso_week();
                format!("{}-W{:02}", iso.year(), iso.week())
            }
            Period::Month => start.format("%Y-%m").to_string(),
            Period::Year => start.format("%Y").to_string(),
        }
    }

    /// Lowercase name used in table file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Period::Day => "daily",
            Period::Week => "weekly",
            Period::Month => "monthly",
            Period::Year => "yearly",
        }
    }

    /// Capitalized name used in chart file names.
    pub fn title(&self) -> &'static str {
        match self {
            Period::Day => "Daily",
            Period::Week => "Weekly",
            Period::Month => "Monthly",
            Period::Year => "Yearly",
        }
    }
}
