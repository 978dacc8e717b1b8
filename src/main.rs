//! CLI entry point for the bike_traffic tool.
//!
//! Provides subcommands for writing a one-shot traffic snapshot, printing a
//! busiest-stations summary, and serving marker data to a map frontend.

use anyhow::Result;
use bike_traffic::loader;
use bike_traffic::marker::build_markers;
use bike_traffic::model::TimeFilter;
use bike_traffic::output::{append_snapshot, print_json, write_geojson};
use bike_traffic::server::run_server;
use bike_traffic::traffic::{compute_station_traffic, filter_trips_by_time, max_traffic};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Bluebikes lab datasets, used when neither flags nor env vars say
/// otherwise.
const DEFAULT_STATIONS_URL: &str = "https://dsc106.com/labs/lab07/data/bluebikes-stations.json";
const DEFAULT_TRIPS_URL: &str =
    "https://dsc106.com/labs/lab07/data/bluebikes-traffic-2024-03.csv";

#[derive(Parser)]
#[command(name = "bike_traffic")]
#[command(about = "Analyze and serve bike-share station traffic", long_about = None)]
struct Cli {
    /// Station metadata JSON: file path or URL (env: STATIONS_URL)
    #[arg(long, global = true)]
    stations: Option<String>,

    /// Trip history CSV: file path or URL (env: TRIPS_URL)
    #[arg(long, global = true)]
    trips: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute per-station traffic and append it to a snapshot CSV
    Snapshot {
        /// Minute of day to filter around (-1 = any time)
        #[arg(short, long, default_value_t = -1)]
        minute: i32,

        /// CSV file to append station stats to
        #[arg(short, long, default_value = "traffic.csv")]
        output: String,

        /// Also write markers as GeoJSON to this path
        #[arg(long)]
        geojson: Option<String>,

        /// Print the marker list as JSON to stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Log the busiest stations for a time window
    Summary {
        /// Minute of day to filter around (-1 = any time)
        #[arg(short, long, default_value_t = -1)]
        minute: i32,

        /// Number of stations to list
        #[arg(short = 'n', long, default_value_t = 10)]
        top: usize,
    },
    /// Serve marker and station data over HTTP for a map frontend
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bike_traffic.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bike_traffic.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let stations_src = resolve_source(cli.stations, "STATIONS_URL", DEFAULT_STATIONS_URL);
    let trips_src = resolve_source(cli.trips, "TRIPS_URL", DEFAULT_TRIPS_URL);

    match cli.command {
        Commands::Snapshot {
            minute,
            output,
            geojson,
            json,
        } => {
            let dataset = loader::load_dataset(&stations_src, &trips_src).await?;
            let filter = TimeFilter::from_slider(minute);

            // Radius domain is anchored at the unfiltered maximum; the
            // filter only changes which trips count and the radius range.
            let all_trips = filter_trips_by_time(&dataset.trips, TimeFilter::Any);
            let base_stats = compute_station_traffic(&dataset.stations, &all_trips);
            let domain_max = max_traffic(&base_stats);

            let filtered = filter_trips_by_time(&dataset.trips, filter);
            let stats = compute_station_traffic(&dataset.stations, &filtered);

            append_snapshot(&output, &stats)?;

            let markers = build_markers(&stats, filter, domain_max);
            if let Some(path) = geojson {
                write_geojson(&path, &markers)?;
            }
            if json {
                print_json(&markers)?;
            }

            info!(
                output,
                time = filter.label().as_deref().unwrap_or("any time"),
                trip_count = filtered.len(),
                station_count = stats.len(),
                "Snapshot written"
            );
        }
        Commands::Summary { minute, top } => {
            let dataset = loader::load_dataset(&stations_src, &trips_src).await?;
            let filter = TimeFilter::from_slider(minute);

            let filtered = filter_trips_by_time(&dataset.trips, filter);
            let mut stats = compute_station_traffic(&dataset.stations, &filtered);
            stats.sort_by(|a, b| b.total_traffic.cmp(&a.total_traffic));

            let quiet = stats.iter().filter(|s| s.total_traffic == 0).count();

            for s in stats.iter().take(top) {
                let departure_share = if s.total_traffic == 0 {
                    0.0
                } else {
                    s.departures as f64 / s.total_traffic as f64
                };

                info!(
                    station = %s.short_name,
                    name = s.name.as_deref().unwrap_or(""),
                    total_traffic = s.total_traffic,
                    departures = s.departures,
                    arrivals = s.arrivals,
                    departure_share = format!("{departure_share:.2}"),
                    "Station"
                );
            }

            info!(
                time = filter.label().as_deref().unwrap_or("any time"),
                trip_count = filtered.len(),
                station_count = stats.len(),
                quiet_stations = quiet,
                skipped_trips = dataset.skipped_trips,
                "Traffic summary"
            );
        }
        Commands::Serve { bind, port } => {
            let dataset = loader::load_dataset(&stations_src, &trips_src).await?;
            run_server(dataset, &bind, port).await?;
        }
    }

    Ok(())
}

/// CLI flag wins, then the environment variable, then the built-in default.
fn resolve_source(flag: Option<String>, env_var: &str, default: &str) -> String {
    flag.or_else(|| std::env::var(env_var).ok())
        .unwrap_or_else(|| default.to_string())
}
