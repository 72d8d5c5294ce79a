//! Hand-off of finished series to the hosting page.
//!
//! Supports debug logging, JSON serialization, and a flat CSV of points.

use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::series::ChartSeries;

/// Logs a series using Rust's debug pretty-print format.
pub fn print_pretty(series: &ChartSeries) {
    debug!("{:#?}", series);
}

/// Serializes any presenter payload as pretty-printed JSON.
pub fn to_json(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Writes a presenter payload as JSON, replacing any previous file.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let json = to_json(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "JSON written");
    Ok(())
}

/// Writes the points of `series` as CSV with a header row.
///
/// The file is rewritten on every call so a refresh never accumulates
/// points from an earlier series.
pub fn write_points_csv(path: &Path, series: &ChartSeries) -> Result<()> {
    debug!(path = %path.display(), points = series.points.len(), "Writing points CSV");

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    for point in &series.points {
        writer.serialize(point)?;
    }
    writer.flush()?;

    Ok(())
}
