//! Domain types for bike-share stations, trips, and the time-of-day filter.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer};

/// Minutes in a day; valid filter minutes are `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u32 = 1440;

/// A fixed docking location. The `short_name` code is the join key against
/// trip records (`start_station_id`/`end_station_id` use the same codes).
#[derive(Debug, Clone, Deserialize)]
pub struct Station {
    pub short_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub lat: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub lon: f64,
}

/// One rental event. Immutable once parsed; the full trip list is loaded
/// once and every recomputation reads it fresh.
#[derive(Debug, Clone, Deserialize)]
pub struct Trip {
    pub start_station_id: String,
    pub end_station_id: String,
    #[serde(deserialize_with = "trip_timestamp")]
    pub started_at: NaiveDateTime,
    #[serde(deserialize_with = "trip_timestamp")]
    pub ended_at: NaiveDateTime,
}

/// The UI slider state as an explicit value instead of shared mutable state.
///
/// The slider reports an integer where `-1` means "any time" and `0..=1439`
/// selects a minute of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    Any,
    Minute(u32),
}

impl TimeFilter {
    /// Builds a filter from the raw slider value. Negative values are the
    /// "any time" sentinel; in-range values select a minute of day.
    pub fn from_slider(raw: i32) -> Self {
        if raw < 0 {
            TimeFilter::Any
        } else {
            TimeFilter::Minute((raw as u32).min(MINUTES_PER_DAY - 1))
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TimeFilter::Any)
    }

    /// Human-readable time label for display next to the slider, or `None`
    /// when unfiltered (the host UI shows its "any time" label instead).
    pub fn label(&self) -> Option<String> {
        match self {
            TimeFilter::Any => None,
            TimeFilter::Minute(m) => Some(format_minute(*m)),
        }
    }
}

/// Minute-of-day for a timestamp, ignoring seconds.
pub fn minutes_since_midnight(t: NaiveDateTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Formats a minute-of-day as a short clock time, e.g. `8:05 AM`.
pub fn format_minute(minute: u32) -> String {
    let minute = minute % MINUTES_PER_DAY;
    let time = NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).unwrap_or(NaiveTime::MIN);
    time.format("%-I:%M %p").to_string()
}

/// The published station file stores lat/lon inconsistently (sometimes
/// numbers, sometimes quoted strings), so accept both.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
    }

    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

/// Trip exports write timestamps both as `2024-03-01 08:15:42` and with a
/// `T` separator; try both before giving up.
fn trip_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.trim();

    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(serde::de::Error::custom)
}
