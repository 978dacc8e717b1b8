//! Render-binder data: everything the host map needs to draw one station
//! circle, minus the viewport projection (which stays in the map engine).

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use serde::Serialize;

use crate::model::TimeFilter;
use crate::scale::{SqrtScale, flow_bucket};
use crate::traffic::StationStats;

/// One on-screen station marker. `flow` is the quantized departure-share
/// bucket the frontend feeds into its color interpolation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub station_id: String,
    pub name: Option<String>,
    pub lon: f64,
    pub lat: f64,
    pub radius: f64,
    pub flow: f64,
    pub tooltip: String,
}

/// Maps aggregated station stats to ready-to-render markers.
///
/// `domain_max` is the busiest station's traffic over the *unfiltered* trip
/// set; the radius domain stays fixed across filter changes and only the
/// range widens when a time filter is active, so a quiet time window draws
/// small markers instead of stretching to fill the scale.
pub fn build_markers(stats: &[StationStats], filter: TimeFilter, domain_max: usize) -> Vec<Marker> {
    let scale = SqrtScale::for_filter(domain_max, filter);

    stats
        .iter()
        .map(|s| Marker {
            station_id: s.short_name.clone(),
            name: s.name.clone(),
            lon: s.lon,
            lat: s.lat,
            radius: scale.radius(s.total_traffic),
            flow: flow_bucket(s.departures, s.total_traffic),
            tooltip: format!(
                "{} trips ({} departures, {} arrivals)",
                s.total_traffic, s.departures, s.arrivals
            ),
        })
        .collect()
}

/// Converts markers into a GeoJSON `FeatureCollection` of points, with the
/// marker attributes as feature properties.
pub fn markers_to_geojson(markers: &[Marker]) -> FeatureCollection {
    let features = markers
        .iter()
        .map(|marker| {
            let point = geo_types::Point::new(marker.lon, marker.lat);

            let mut properties = JsonObject::new();
            properties.insert("stationId".into(), marker.station_id.clone().into());
            if let Some(name) = &marker.name {
                properties.insert("name".into(), name.clone().into());
            }
            properties.insert("radius".into(), marker.radius.into());
            properties.insert("flow".into(), marker.flow.into());
            properties.insert("tooltip".into(), marker.tooltip.clone().into());

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoValue::from(&point))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
