//! PNG chart rendering.
//!
//! Thin wrappers over `plotters`: every chart is a deterministic function
//! of vehicle + metric, so file names are stable across runs.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use plotters::prelude::*;
use tracing::debug;

use crate::analyzers::aggregate::BucketSummary;
use crate::analyzers::period::Period;

const CHART_SIZE: (u32, u32) = (1280, 720);
const LABEL_MAX: usize = 24;

fn clip_label(label: &str) -> String {
    if label.chars().count() <= LABEL_MAX {
        label.to_string()
    } else {
        let clipped: String = label.chars().take(LABEL_MAX - 1).collect();
        format!("{clipped}…")
    }
}

/// Bar chart of a vehicle's most-visited destinations, as
/// `{vehicle}_{Period}_Top_Locations.png`. Skipped when the ranking is
/// empty.
pub fn render_top_locations(
    out_dir: &Path,
    vehicle: &str,
    period: Period,
    ranking: &[(String, usize)],
) -> Result<()> {
    if ranking.is_empty() {
        return Ok(());
    }

    let path = out_dir.join(format!("{vehicle}_{}_Top_Locations.png", period.title()));
    let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let max_visits = ranking.iter().map(|(_, count)| *count).max().unwrap_or(1) as i32;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{} Top Locations for {vehicle}", period.title()),
            ("sans-serif", 30),
        )
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(ranking.len() as f64 - 0.5), 0i32..max_visits + 1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(ranking.len())
        .x_label_formatter(&|x| {
            let i = x.round();
            if i < 0.0 {
                return String::new();
            }
            ranking
                .get(i as usize)
                .map(|(name, _)| clip_label(name))
                .unwrap_or_default()
        })
        .y_desc("Visits")
        .draw()?;

    chart.draw_series(ranking.iter().enumerate().map(|(i, (_, count))| {
        Rectangle::new(
            [(i as f64 - 0.4, 0), (i as f64 + 0.4, *count as i32)],
            BLUE.mix(0.6).filled(),
        )
    }))?;

    root.present()?;
    debug!(path = %path.display(), "Chart written");
    Ok(())
}

fn render_line(
    path: &Path,
    caption: &str,
    y_desc: &str,
    labels: &[String],
    values: &[f64],
) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = (values.len() as i32 - 1).max(1);
    let y_max = values.iter().copied().fold(0.0f64, f64::max).max(1.0) * 1.1;
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d(0i32..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_labels(labels.len().min(12))
        .x_label_formatter(&|x| {
            labels
                .get(*x as usize)
                .map(|label| label.clone())
                .unwrap_or_default()
        })
        .y_desc(y_desc)
        .draw()?;

    chart.draw_series(LineSeries::new(
        values.iter().enumerate().map(|(i, v)| (i as i32, *v)),
        &RED,
    ))?;

    root.present()?;
    debug!(path = %path.display(), "Chart written");
    Ok(())
}

/// Line chart of visits per bucket, as `{vehicle}_{Period}_Visits.png`.
pub fn render_visit_series(
    out_dir: &Path,
    vehicle: &str,
    period: Period,
    series: &[(NaiveDate, BucketSummary)],
) -> Result<()> {
    let labels: Vec<String> = series.iter().map(|(bucket, _)| period.label(*bucket)).collect();
    let values: Vec<f64> = series.iter().map(|(_, s)| s.visits as f64).collect();
    render_line(
        &out_dir.join(format!("{vehicle}_{}_Visits.png", period.title())),
        &format!("{} Visits for {vehicle}", period.title()),
        "Visits",
        &labels,
        &values,
    )
}

/// Line chart of driving hours per bucket, as
/// `{vehicle}_{Period}_Total_Driving_Time.png`.
pub fn render_driving_series(
    out_dir: &Path,
    vehicle: &str,
    period: Period,
    series: &[(NaiveDate, BucketSummary)],
) -> Result<()> {
    let labels: Vec<String> = series.iter().map(|(bucket, _)| period.label(*bucket)).collect();
    let values: Vec<f64> = series.iter().map(|(_, s)| s.driving_hours).collect();
    render_line(
        &out_dir.join(format!(
            "{vehicle}_{}_Total_Driving_Time.png",
            period.title()
        )),
        &format!("{} Total Driving Time (hrs) for {vehicle}", period.title()),
        "Driving time (hours)",
        &labels,
        &values,
    )
}

/// Fleet-wide fuel-economy trend, one line per vehicle, as
/// `Fuel_Economy_Trend.png`. Skipped when the trend is empty.
pub fn render_fuel_trend(
    out_dir: &Path,
    trend: &BTreeMap<(String, NaiveDate), f64>,
) -> Result<()> {
    if trend.is_empty() {
        return Ok(());
    }

    let months: Vec<NaiveDate> = {
        let mut months: Vec<NaiveDate> = trend.keys().map(|(_, month)| *month).collect();
        months.sort();
        months.dedup();
        months
    };
    let vehicles: Vec<&str> = {
        let mut vehicles: Vec<&str> = trend.keys().map(|(vehicle, _)| vehicle.as_str()).collect();
        vehicles.sort();
        vehicles.dedup();
        vehicles
    };

    let y_max = trend.values().copied().fold(0.0f64, f64::max).max(1.0) * 1.1;
    let x_max = (months.len() as i32 - 1).max(1);

    let path = out_dir.join("Fuel_Economy_Trend.png");
    let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Fuel Economy Trend Over Time", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d(0i32..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_labels(months.len().min(12))
        .x_label_formatter(&|x| {
            months
                .get(*x as usize)
                .map(|month| Period::Month.label(*month))
                .unwrap_or_default()
        })
        .y_desc("Fuel economy (km/l)")
        .draw()?;

    for (i, vehicle) in vehicles.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        let points: Vec<(i32, f64)> = months
            .iter()
            .enumerate()
            .filter_map(|(x, month)| {
                trend
                    .get(&(vehicle.to_string(), *month))
                    .map(|economy| (x as i32, *economy))
            })
            .collect();

        chart
            .draw_series(LineSeries::new(points, &color))?
            .label(vehicle.to_string())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart.configure_series_labels().border_style(&BLACK).draw()?;

    root.present()?;
    debug!(path = %path.display(), "Chart written");
    Ok(())
}
