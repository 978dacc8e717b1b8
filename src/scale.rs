//! Visual scales: traffic volume to marker radius and departure share to a
//! discrete flow bucket.

use crate::model::TimeFilter;

/// Marker radius range (pixels) when no time filter is active.
pub const RANGE_UNFILTERED: (f64, f64) = (0.0, 25.0);

/// Wider radius range used while a time filter is active; the filtered trip
/// set is much smaller, so the remaining markers get more visual weight and
/// a 3 px floor keeps quiet stations visible.
pub const RANGE_FILTERED: (f64, f64) = (3.0, 50.0);

/// Square-root scale from a `[0, max]` traffic domain to a pixel radius
/// range, so marker *area* tracks trip volume linearly.
#[derive(Debug, Clone, Copy)]
pub struct SqrtScale {
    max: f64,
    range: (f64, f64),
}

impl SqrtScale {
    pub fn new(max: usize, range: (f64, f64)) -> Self {
        Self {
            max: max as f64,
            range,
        }
    }

    /// Picks the radius range for the active filter state: the default
    /// `[0, 25]` when unfiltered, `[3, 50]` when a minute is selected.
    pub fn for_filter(max: usize, filter: TimeFilter) -> Self {
        let range = if filter.is_any() {
            RANGE_UNFILTERED
        } else {
            RANGE_FILTERED
        };
        Self::new(max, range)
    }

    /// Maps a traffic count to a radius. A degenerate domain (`max = 0`,
    /// i.e. no trips anywhere) collapses to the range floor.
    pub fn radius(&self, value: usize) -> f64 {
        let (lo, hi) = self.range;
        if self.max <= 0.0 {
            return lo;
        }
        let t = (value as f64 / self.max).clamp(0.0, 1.0).sqrt();
        lo + (hi - lo) * t
    }
}

/// Quantizes the departure share of a station's traffic into one of three
/// buckets used by the host map's color interpolation:
///
/// | departures / total | bucket |
/// |--------------------|--------|
/// | < 1/3              | 0.0    |
/// | 1/3 ..< 2/3        | 0.5    |
/// | >= 2/3             | 1.0    |
///
/// A station with no traffic has no meaningful ratio and gets the neutral
/// middle bucket.
pub fn flow_bucket(departures: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.5;
    }
    let ratio = departures as f64 / total as f64;
    if ratio < 1.0 / 3.0 {
        0.0
    } else if ratio < 2.0 / 3.0 {
        0.5
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_zero_traffic_unfiltered() {
        let scale = SqrtScale::new(100, RANGE_UNFILTERED);
        assert_eq!(scale.radius(0), 0.0);
    }

    #[test]
    fn test_radius_floor_when_filtered() {
        let scale = SqrtScale::new(100, RANGE_FILTERED);
        assert_eq!(scale.radius(0), 3.0);
        assert!(scale.radius(1) > 3.0);
    }

    #[test]
    fn test_radius_max_hits_range_top() {
        let scale = SqrtScale::new(400, RANGE_UNFILTERED);
        assert!((scale.radius(400) - 25.0).abs() < 1e-9);

        let scale = SqrtScale::new(400, RANGE_FILTERED);
        assert!((scale.radius(400) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_radius_sqrt_shape() {
        // A quarter of the max traffic should land at half the radius span
        let scale = SqrtScale::new(100, RANGE_UNFILTERED);
        assert!((scale.radius(25) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_radius_degenerate_domain() {
        assert_eq!(SqrtScale::new(0, RANGE_UNFILTERED).radius(0), 0.0);
        assert_eq!(SqrtScale::new(0, RANGE_FILTERED).radius(0), 3.0);
    }

    #[test]
    fn test_for_filter_picks_range() {
        use crate::model::TimeFilter;

        let unfiltered = SqrtScale::for_filter(10, TimeFilter::Any);
        let filtered = SqrtScale::for_filter(10, TimeFilter::Minute(540));
        assert_eq!(unfiltered.radius(0), 0.0);
        assert_eq!(filtered.radius(0), 3.0);
    }

    #[test]
    fn test_flow_bucket_thirds() {
        assert_eq!(flow_bucket(0, 10), 0.0);
        assert_eq!(flow_bucket(3, 10), 0.0);
        assert_eq!(flow_bucket(4, 10), 0.5);
        assert_eq!(flow_bucket(5, 10), 0.5);
        assert_eq!(flow_bucket(6, 10), 0.5);
        assert_eq!(flow_bucket(7, 10), 1.0);
        assert_eq!(flow_bucket(10, 10), 1.0);
    }

    #[test]
    fn test_flow_bucket_zero_traffic_is_neutral() {
        assert_eq!(flow_bucket(0, 0), 0.5);
    }
}
