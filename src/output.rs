//! Output formatting and persistence for station traffic snapshots.
//!
//! Supports pretty-printing, JSON, CSV append, and GeoJSON files.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::marker::{Marker, markers_to_geojson};
use crate::traffic::StationStats;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// One CSV row: a station's stats stamped with the time the snapshot was
/// taken, so successive appends to the same file stay distinguishable.
#[derive(Debug, Serialize)]
struct SnapshotRow<'a> {
    timestamp: DateTime<Utc>,
    short_name: &'a str,
    name: Option<&'a str>,
    lat: f64,
    lon: f64,
    arrivals: usize,
    departures: usize,
    total_traffic: usize,
}

impl<'a> SnapshotRow<'a> {
    fn new(timestamp: DateTime<Utc>, stats: &'a StationStats) -> Self {
        Self {
            timestamp,
            short_name: &stats.short_name,
            name: stats.name.as_deref(),
            lat: stats.lat,
            lon: stats.lon,
            arrivals: stats.arrivals,
            departures: stats.departures,
            total_traffic: stats.total_traffic,
        }
    }
}

/// Logs station stats using Rust's debug pretty-print format.
pub fn print_pretty(stats: &[StationStats]) {
    debug!("{:#?}", stats);
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends station stat rows to a CSV file, all stamped with the same
/// snapshot time.
///
/// Creates the file with headers if it does not already exist.
pub fn append_snapshot(path: &str, stats: &[StationStats]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = stats.len(), "Appending CSV snapshot");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    let taken_at = Utc::now();
    for row in stats {
        writer.serialize(SnapshotRow::new(taken_at, row))?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes markers to `path` as a GeoJSON FeatureCollection.
pub fn write_geojson(path: &str, markers: &[Marker]) -> Result<()> {
    let collection = markers_to_geojson(markers);
    std::fs::write(path, serde_json::to_string_pretty(&collection)?)?;
    info!(path, features = markers.len(), "GeoJSON written");
    Ok(())
}
