//! HTTP interface for the host map frontend.
//!
//! The dataset is loaded once before the server starts and shared read-only
//! behind [`web::Data`]. Each request re-runs filter → aggregate → marker
//! build over the immutable base trip list, mirroring what the slider's
//! input handler does in the browser: one bounded, synchronous
//! recomputation per event.

use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::loader::Dataset;
use crate::marker::{Marker, build_markers};
use crate::model::TimeFilter;
use crate::traffic::{
    StationStats, compute_station_traffic, filter_trips_by_time, max_traffic,
};

/// Shared, read-only server state: the dataset plus the unfiltered traffic
/// maximum that anchors the radius scale domain for every request.
pub struct AppState {
    dataset: Dataset,
    domain_max: usize,
}

impl AppState {
    pub fn new(dataset: Dataset) -> Self {
        let all = filter_trips_by_time(&dataset.trips, TimeFilter::Any);
        let base_stats = compute_station_traffic(&dataset.stations, &all);
        let domain_max = max_traffic(&base_stats);

        Self {
            dataset,
            domain_max,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    /// Raw slider value: minute of day, or -1 (or absent) for "any time".
    minute: Option<i32>,
}

impl FilterQuery {
    fn time_filter(&self) -> TimeFilter {
        TimeFilter::from_slider(self.minute.unwrap_or(-1))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkersResponse {
    /// Formatted clock time for the slider label; `null` means the frontend
    /// should show its "any time" label instead.
    pub time_label: Option<String>,
    pub trip_count: usize,
    pub markers: Vec<Marker>,
}

#[actix_web::get("/markers")]
#[tracing::instrument(skip(data), fields(minute = ?query.minute))]
async fn markers(query: web::Query<FilterQuery>, data: web::Data<AppState>) -> impl Responder {
    let filter = query.time_filter();

    let filtered = filter_trips_by_time(&data.dataset.trips, filter);
    let stats = compute_station_traffic(&data.dataset.stations, &filtered);
    let markers = build_markers(&stats, filter, data.domain_max);

    HttpResponse::Ok().json(MarkersResponse {
        time_label: filter.label(),
        trip_count: filtered.len(),
        markers,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StationsResponse {
    time_label: Option<String>,
    stations: Vec<StationStats>,
}

#[actix_web::get("/stations")]
#[tracing::instrument(skip(data), fields(minute = ?query.minute))]
async fn stations(query: web::Query<FilterQuery>, data: web::Data<AppState>) -> impl Responder {
    let filter = query.time_filter();

    let filtered = filter_trips_by_time(&data.dataset.trips, filter);
    let stats = compute_station_traffic(&data.dataset.stations, &filtered);

    HttpResponse::Ok().json(StationsResponse {
        time_label: filter.label(),
        stations: stats,
    })
}

#[actix_web::get("/healthz")]
async fn healthz(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "stations": data.dataset.stations.len(),
        "trips": data.dataset.trips.len(),
    }))
}

/// Runs the marker server until interrupted.
pub async fn run_server(dataset: Dataset, bind: &str, port: u16) -> Result<()> {
    info!(
        bind,
        port,
        stations = dataset.stations.len(),
        trips = dataset.trips.len(),
        "Serving station markers"
    );

    let data = web::Data::new(AppState::new(dataset));

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .service(markers)
            .service(stations)
            .service(healthz)
    })
    .bind((bind, port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web};
    use chrono::NaiveDate;

    use crate::model::{Station, Trip};

    fn fixture_dataset() -> Dataset {
        let at = |h: u32, m: u32| {
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap()
        };

        Dataset {
            stations: vec![
                Station {
                    short_name: "A".into(),
                    name: Some("Alpha".into()),
                    lat: 42.36,
                    lon: -71.09,
                },
                Station {
                    short_name: "B".into(),
                    name: Some("Beta".into()),
                    lat: 42.37,
                    lon: -71.10,
                },
            ],
            trips: vec![
                Trip {
                    start_station_id: "A".into(),
                    end_station_id: "B".into(),
                    started_at: at(8, 0),
                    ended_at: at(8, 20),
                },
                Trip {
                    start_station_id: "B".into(),
                    end_station_id: "A".into(),
                    started_at: at(17, 30),
                    ended_at: at(17, 50),
                },
            ],
            skipped_trips: 0,
        }
    }

    async fn get_json(path: &str) -> serde_json::Value {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(fixture_dataset())))
                .service(markers)
                .service(stations)
                .service(healthz),
        )
        .await;

        let req = test::TestRequest::get().uri(path).to_request();
        test::call_and_read_body_json(&app, req).await
    }

    #[actix_web::test]
    async fn test_markers_unfiltered() {
        let body = get_json("/markers").await;

        assert!(body["timeLabel"].is_null());
        assert_eq!(body["tripCount"], 2);
        assert_eq!(body["markers"].as_array().unwrap().len(), 2);
        assert_eq!(body["markers"][0]["stationId"], "A");
    }

    #[actix_web::test]
    async fn test_markers_sentinel_minute_means_any() {
        let body = get_json("/markers?minute=-1").await;

        assert!(body["timeLabel"].is_null());
        assert_eq!(body["tripCount"], 2);
    }

    #[actix_web::test]
    async fn test_markers_filtered_by_minute() {
        // 9:00 AM window catches only the morning trip
        let body = get_json("/markers?minute=540").await;

        assert_eq!(body["timeLabel"], "9:00 AM");
        assert_eq!(body["tripCount"], 1);
        // filtered range floor keeps quiet markers visible, while the
        // unfiltered domain keeps half-traffic stations off the 50 px top
        let radii: Vec<f64> = body["markers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["radius"].as_f64().unwrap())
            .collect();
        assert!(radii.iter().all(|r| *r >= 3.0));
        assert!(radii.iter().all(|r| *r < 50.0));
    }

    #[actix_web::test]
    async fn test_stations_endpoint_counts() {
        let body = get_json("/stations?minute=540").await;

        let rows = body["stations"].as_array().unwrap();
        let a = rows.iter().find(|s| s["short_name"] == "A").unwrap();
        assert_eq!(a["departures"], 1);
        assert_eq!(a["arrivals"], 0);
        assert_eq!(a["total_traffic"], 1);
    }

    #[actix_web::test]
    async fn test_healthz_reports_dataset_size() {
        let body = get_json("/healthz").await;
        assert_eq!(body["stations"], 2);
        assert_eq!(body["trips"], 2);
    }
}
