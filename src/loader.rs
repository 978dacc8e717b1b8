//! Dataset ingest: the GBFS-style station JSON and the trip history CSV.
//!
//! Both sources may be a local file path or an HTTP(S) URL. Parsing is
//! strict about the station envelope (a bad station file is a hard error)
//! but lenient about individual trip rows, which are skipped with a warning
//! so one malformed export line cannot take the whole tool down.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::fetch::{BasicClient, fetch_bytes};
use crate::model::{Station, Trip};

/// Everything loaded at startup. Immutable afterwards; every recomputation
/// borrows from it.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub stations: Vec<Station>,
    pub trips: Vec<Trip>,
    /// Trip rows dropped during parsing (bad timestamps, short rows).
    pub skipped_trips: usize,
}

/// Wire shape of the station file: `{"data": {"stations": [...]}}`.
#[derive(Deserialize)]
struct StationFile {
    data: StationData,
}

#[derive(Deserialize)]
struct StationData {
    stations: Vec<Station>,
}

/// Parses the station metadata JSON, unwrapping the `data.stations`
/// envelope.
pub fn parse_stations(bytes: &[u8]) -> Result<Vec<Station>> {
    let file: StationFile =
        serde_json::from_slice(bytes).context("station file is not valid station JSON")?;
    Ok(file.data.stations)
}

/// Parses the trip history CSV. Returns the trips that parsed cleanly and
/// the number of rows skipped.
pub fn parse_trips(bytes: &[u8]) -> Result<(Vec<Trip>, usize)> {
    let mut reader = csv::Reader::from_reader(bytes);

    let mut trips = Vec::new();
    let mut skipped = 0usize;

    for (index, row) in reader.deserialize::<Trip>().enumerate() {
        match row {
            Ok(trip) => trips.push(trip),
            Err(e) => {
                skipped += 1;
                warn!(row = index + 1, error = %e, "Skipping malformed trip row");
            }
        }
    }

    if trips.is_empty() && skipped > 0 {
        return Err(anyhow::anyhow!(
            "no trip row parsed; {skipped} rows were malformed"
        ));
    }

    Ok((trips, skipped))
}

/// Loads source data from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %source))]
async fn read_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http") {
        let client = BasicClient::new()?;
        fetch_bytes(&client, source).await?
    } else {
        std::fs::read(source).with_context(|| format!("reading {source}"))?
    };
    debug!(bytes = bytes.len(), "Source read");
    Ok(bytes)
}

/// Fetches and parses both datasets.
#[tracing::instrument(skip_all, fields(stations_src, trips_src))]
pub async fn load_dataset(stations_src: &str, trips_src: &str) -> Result<Dataset> {
    let station_bytes = read_source(stations_src)
        .await
        .context("fetching station metadata")?;
    let trip_bytes = read_source(trips_src)
        .await
        .context("fetching trip history")?;

    let stations = parse_stations(&station_bytes)?;
    let (trips, skipped_trips) = parse_trips(&trip_bytes)?;

    info!(
        station_count = stations.len(),
        trip_count = trips.len(),
        skipped_trips,
        "Datasets loaded"
    );

    Ok(Dataset {
        stations,
        trips,
        skipped_trips,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATION_JSON: &str = r#"{
        "last_updated": 1710000000,
        "data": {
            "stations": [
                {"short_name": "A32000", "name": "Central Square", "lat": 42.3656, "lon": -71.1039},
                {"short_name": "B32002", "name": "Kendall/MIT", "lat": "42.3621", "lon": "-71.0842"}
            ]
        }
    }"#;

    #[test]
    fn test_parse_stations_envelope() {
        let stations = parse_stations(STATION_JSON.as_bytes()).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].short_name, "A32000");
        assert_eq!(stations[1].name.as_deref(), Some("Kendall/MIT"));
    }

    #[test]
    fn test_parse_stations_rejects_bad_envelope() {
        assert!(parse_stations(b"{\"stations\": []}").is_err());
        assert!(parse_stations(b"not json").is_err());
    }

    #[test]
    fn test_parse_trips_basic() {
        let csv = "\
ride_id,start_station_id,end_station_id,started_at,ended_at
r1,A32000,B32002,2024-03-01 08:00:00,2024-03-01 08:15:00
r2,B32002,A32000,2024-03-01T17:30:00,2024-03-01T17:50:00
";
        let (trips, skipped) = parse_trips(csv.as_bytes()).unwrap();
        assert_eq!(trips.len(), 2);
        assert_eq!(skipped, 0);
        assert_eq!(trips[0].start_station_id, "A32000");
        assert_eq!(
            trips[1].started_at.format("%H:%M").to_string(),
            "17:30"
        );
    }

    #[test]
    fn test_parse_trips_skips_malformed_rows() {
        let csv = "\
start_station_id,end_station_id,started_at,ended_at
A32000,B32002,2024-03-01 08:00:00,2024-03-01 08:15:00
B32002,A32000,not-a-timestamp,2024-03-01 09:00:00
A32000,B32002,2024-03-01 10:00:00,2024-03-01 10:20:00
";
        let (trips, skipped) = parse_trips(csv.as_bytes()).unwrap();
        assert_eq!(trips.len(), 2);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_parse_trips_all_bad_is_error() {
        let csv = "\
start_station_id,end_station_id,started_at,ended_at
A32000,B32002,bad,worse
";
        assert!(parse_trips(csv.as_bytes()).is_err());
    }
}
