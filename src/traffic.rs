//! Per-station traffic aggregation and time-of-day filtering.
//!
//! Both functions are pure: they read the immutable base trip list and
//! produce fresh output, so re-running them on every slider or viewport
//! event is safe and deterministic.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{Station, TimeFilter, Trip, minutes_since_midnight};

/// Half-width of the time filter window, in minutes either side of the
/// selected minute.
pub const FILTER_WINDOW_MINUTES: u32 = 60;

/// A station annotated with trip counts for the current (possibly filtered)
/// trip set. `total_traffic` is always `arrivals + departures`, recomputed
/// in full each time rather than incrementally updated.
#[derive(Debug, Clone, Serialize)]
pub struct StationStats {
    pub short_name: String,
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub arrivals: usize,
    pub departures: usize,
    pub total_traffic: usize,
}

/// Restricts `trips` to those starting or ending within
/// [`FILTER_WINDOW_MINUTES`] of the selected minute of day.
///
/// Distance is linear, not circular: a trip at minute 5 is not adjacent to
/// a filter at minute 1439. [`TimeFilter::Any`] keeps every trip in order.
pub fn filter_trips_by_time(trips: &[Trip], filter: TimeFilter) -> Vec<&Trip> {
    match filter {
        TimeFilter::Any => trips.iter().collect(),
        TimeFilter::Minute(minute) => trips
            .iter()
            .filter(|trip| {
                let started = minutes_since_midnight(trip.started_at);
                let ended = minutes_since_midnight(trip.ended_at);
                started.abs_diff(minute) <= FILTER_WINDOW_MINUTES
                    || ended.abs_diff(minute) <= FILTER_WINDOW_MINUTES
            })
            .collect(),
    }
}

/// Joins `trips` onto `stations` by short code, counting departures (trip
/// starts) and arrivals (trip ends) per station.
///
/// Stations with no matching trips get zero counts. Trips referencing a
/// station code not present in `stations` still count toward the rollup but
/// surface nowhere; that matches the source datasets, where the trip export
/// routinely mentions decommissioned docks.
pub fn compute_station_traffic(stations: &[Station], trips: &[&Trip]) -> Vec<StationStats> {
    let mut departures: HashMap<&str, usize> = HashMap::new();
    let mut arrivals: HashMap<&str, usize> = HashMap::new();

    for trip in trips {
        *departures.entry(trip.start_station_id.as_str()).or_default() += 1;
        *arrivals.entry(trip.end_station_id.as_str()).or_default() += 1;
    }

    stations
        .iter()
        .map(|station| {
            let id = station.short_name.as_str();
            let arrivals = arrivals.get(id).copied().unwrap_or(0);
            let departures = departures.get(id).copied().unwrap_or(0);

            StationStats {
                short_name: station.short_name.clone(),
                name: station.name.clone(),
                lat: station.lat,
                lon: station.lon,
                arrivals,
                departures,
                total_traffic: arrivals + departures,
            }
        })
        .collect()
}

/// Busiest station's traffic in a stats set. Computed over the unfiltered
/// set, this anchors the radius scale domain across filter changes.
pub fn max_traffic(stats: &[StationStats]) -> usize {
    stats.iter().map(|s| s.total_traffic).max().unwrap_or(0)
}
