// fusion.rs — Temporal fusion of the location and magnetometer streams
//
// Everything in this module is independent of:
//   - file decoding and record encoding
//   - the building-footprint provider
//   - the field model downstream of the fused trace
//
// Raw sample streams in, georeferenced magnetic trace out, so the merge can
// be exercised with recorded or synthetic telemetry alike.
//
// The two streams run at different rates. Each magnetometer sample is
// bracketed by the pair of consecutive location fixes surrounding its
// timestamp and the position is interpolated linearly inside that bracket.
// Magnetometer samples before the first fix are skipped, samples past the
// last fix are dropped; neither is an error.

use std::fmt::{Display, Formatter};

use crate::types::{FusedSample, LocationSample, MagnetometerSample};

/// Contract violations on the pre-sorted entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum FusionError {
    UnsortedLocations { index: usize },
    UnsortedReadings { index: usize },
}

impl Display for FusionError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            FusionError::UnsortedLocations { index } => {
                write!(f, "location stream runs backwards at row {}", index)
            }
            FusionError::UnsortedReadings { index } => {
                write!(f, "magnetometer stream runs backwards at row {}", index)
            }
        }
    }
}

impl std::error::Error for FusionError {}

/// Fuse raw telemetry, taking care of stream hygiene first.
///
/// Rows with non-finite fields are discarded (with a warning), then both
/// streams are stably sorted by timestamp before the merge. Insufficient
/// data yields an empty trace rather than an error.
pub fn fuse_streams(
    locations: Vec<LocationSample>,
    readings: Vec<MagnetometerSample>,
) -> Vec<FusedSample> {
    let mut locations = discard_malformed_locations(locations);
    let mut readings = discard_malformed_readings(readings);
    locations.sort_by_key(|s| s.time);
    readings.sort_by_key(|s| s.time);
    merge(&locations, &readings)
}

/// Fuse streams the caller has already ordered.
///
/// Validates that neither stream steps backwards in time and fails fast on
/// a violation instead of interpolating garbage. Finite fields are the
/// caller's responsibility on this entry point.
pub fn fuse_sorted(
    locations: &[LocationSample],
    readings: &[MagnetometerSample],
) -> Result<Vec<FusedSample>, FusionError> {
    if let Some(index) = first_backwards_step(locations.iter().map(|s| s.time)) {
        return Err(FusionError::UnsortedLocations { index });
    }
    if let Some(index) = first_backwards_step(readings.iter().map(|s| s.time)) {
        return Err(FusionError::UnsortedReadings { index });
    }
    Ok(merge(locations, readings))
}

// ─── Merge core ──────────────────────────────────────────────────────────────

fn merge(locations: &[LocationSample], readings: &[MagnetometerSample]) -> Vec<FusedSample> {
    if locations.len() < 2 || readings.is_empty() {
        log::debug!(
            "not enough telemetry to fuse ({} location fixes, {} magnetometer samples)",
            locations.len(),
            readings.len()
        );
        return Vec::new();
    }

    let mut fused = Vec::with_capacity(readings.len());
    let last = locations.len() - 1;
    let mut loc_idx = 0;
    let mut skipped_early = 0usize;

    for (idx, mag) in readings.iter().enumerate() {
        // Advance the bracket until it surrounds this reading.
        while loc_idx < last && locations[loc_idx + 1].time < mag.time {
            loc_idx += 1;
        }
        if loc_idx >= last {
            log::debug!(
                "dropped {} magnetometer samples past the last location fix",
                readings.len() - idx
            );
            break;
        }

        let begin = &locations[loc_idx];
        let end = &locations[loc_idx + 1];
        if mag.time < begin.time {
            skipped_early += 1;
            continue;
        }

        let ratio = bracket_ratio(begin.time, end.time, mag.time);
        fused.push(FusedSample::new(
            mag.time,
            lerp(begin.latitude, end.latitude, ratio),
            lerp(begin.longitude, end.longitude, ratio),
            lerp(begin.altitude, end.altitude, ratio),
            mag.x,
            mag.y,
            mag.z,
        ));
    }

    if skipped_early > 0 {
        log::debug!(
            "skipped {} magnetometer samples before the first location fix",
            skipped_early
        );
    }
    fused
}

/// Interpolation factor of `at` inside `[start, end]`, in [0, 1].
/// Duplicate fix timestamps collapse the bracket onto its left edge.
fn bracket_ratio(start: i64, end: i64, at: i64) -> f64 {
    let span = end - start;
    if span == 0 {
        return 0.0;
    }
    (at - start) as f64 / span as f64
}

fn lerp(a: f64, b: f64, ratio: f64) -> f64 {
    a + (b - a) * ratio
}

fn first_backwards_step(times: impl Iterator<Item = i64>) -> Option<usize> {
    let mut prev: Option<i64> = None;
    for (i, t) in times.enumerate() {
        if let Some(p) = prev {
            if t < p {
                return Some(i);
            }
        }
        prev = Some(t);
    }
    None
}

fn discard_malformed_locations(rows: Vec<LocationSample>) -> Vec<LocationSample> {
    let before = rows.len();
    let kept: Vec<LocationSample> = rows.into_iter().filter(|r| r.is_finite()).collect();
    if kept.len() < before {
        log::warn!(
            "discarded {} location rows with non-finite fields",
            before - kept.len()
        );
    }
    kept
}

fn discard_malformed_readings(rows: Vec<MagnetometerSample>) -> Vec<MagnetometerSample> {
    let before = rows.len();
    let kept: Vec<MagnetometerSample> = rows.into_iter().filter(|r| r.is_finite()).collect();
    if kept.len() < before {
        log::warn!(
            "discarded {} magnetometer rows with non-finite fields",
            before - kept.len()
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn loc(time: i64, latitude: f64, longitude: f64) -> LocationSample {
        LocationSample {
            time,
            latitude,
            longitude,
            altitude: 0.0,
            speed: 0.0,
            bearing: 0.0,
        }
    }

    fn mag(time: i64, x: f64, y: f64, z: f64) -> MagnetometerSample {
        MagnetometerSample { time, x, y, z }
    }

    #[test]
    fn test_midpoint_interpolation() {
        let locations = vec![loc(0, 45.0, 5.0), loc(10, 45.001, 5.001)];
        let readings = vec![mag(5, 10.0, 0.0, 0.0)];

        let fused = fuse_streams(locations, readings);

        assert_eq!(fused.len(), 1);
        assert_relative_eq!(fused[0].latitude, 45.0005, epsilon = 1e-9);
        assert_relative_eq!(fused[0].longitude, 5.0005, epsilon = 1e-9);
        assert_relative_eq!(fused[0].magnitude, 10.0, epsilon = 1e-9);
        assert_eq!(fused[0].time, 5);
    }

    #[test]
    fn test_fused_positions_stay_inside_brackets() {
        let locations = vec![
            loc(0, 32.2000, -110.9000),
            loc(1_000, 32.2004, -110.8996),
            loc(2_500, 32.2007, -110.8991),
            loc(4_000, 32.2013, -110.8984),
        ];
        let readings: Vec<MagnetometerSample> =
            (0..40).map(|i| mag(i * 100, 20.0, 5.0, 40.0)).collect();

        let fused = fuse_streams(locations.clone(), readings.clone());

        assert!(fused.len() <= readings.len());
        for sample in &fused {
            assert!(sample.latitude >= 32.2000 && sample.latitude <= 32.2013);
            assert!(sample.longitude >= -110.9000 && sample.longitude <= -110.8984);
        }
    }

    #[test]
    fn test_fusion_is_idempotent() {
        let locations = vec![loc(0, 45.0, 5.0), loc(400, 45.002, 5.003), loc(900, 45.004, 5.004)];
        let readings: Vec<MagnetometerSample> =
            (0..12).map(|i| mag(i * 80, 1.0 + i as f64, 0.0, 2.0)).collect();

        let first = fuse_streams(locations.clone(), readings.clone());
        let second = fuse_streams(locations, readings);
        assert_eq!(first, second);
    }

    #[test]
    fn test_readings_before_first_fix_are_skipped() {
        let locations = vec![loc(100, 45.0, 5.0), loc(200, 45.001, 5.001)];
        let readings = vec![mag(0, 1.0, 0.0, 0.0), mag(50, 1.0, 0.0, 0.0), mag(150, 1.0, 0.0, 0.0)];

        let fused = fuse_streams(locations, readings);

        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].time, 150);
    }

    #[test]
    fn test_readings_past_last_fix_are_dropped() {
        let locations = vec![loc(0, 45.0, 5.0), loc(100, 45.001, 5.001)];
        let readings = vec![
            mag(50, 1.0, 0.0, 0.0),
            mag(100, 1.0, 0.0, 0.0),
            mag(150, 1.0, 0.0, 0.0),
            mag(900, 1.0, 0.0, 0.0),
        ];

        let fused = fuse_streams(locations, readings);

        // The reading landing exactly on the last fix still has a bracket;
        // everything after it does not.
        assert_eq!(fused.len(), 2);
        assert_eq!(fused[1].time, 100);
        assert_relative_eq!(fused[1].latitude, 45.001, epsilon = 1e-9);
    }

    #[test]
    fn test_insufficient_streams_fuse_to_nothing() {
        assert!(fuse_streams(vec![loc(0, 45.0, 5.0)], vec![mag(1, 1.0, 0.0, 0.0)]).is_empty());
        assert!(fuse_streams(Vec::new(), vec![mag(1, 1.0, 0.0, 0.0)]).is_empty());
        assert!(fuse_streams(vec![loc(0, 45.0, 5.0), loc(10, 45.0, 5.0)], Vec::new()).is_empty());
    }

    #[test]
    fn test_malformed_rows_are_rejected() {
        let locations = vec![
            loc(0, 45.0, 5.0),
            loc(5, f64::NAN, 5.0005),
            loc(10, 45.001, 5.001),
        ];
        let readings = vec![mag(5, 10.0, 0.0, 0.0), mag(7, f64::INFINITY, 0.0, 0.0)];

        let fused = fuse_streams(locations, readings);

        // The NaN fix vanishes, so interpolation runs over the full bracket.
        assert_eq!(fused.len(), 1);
        assert_relative_eq!(fused[0].latitude, 45.0005, epsilon = 1e-9);
    }

    #[test]
    fn test_duplicate_fix_timestamps_collapse_left() {
        let locations = vec![loc(0, 45.0, 5.0), loc(0, 46.0, 6.0), loc(10, 47.0, 7.0)];
        let readings = vec![mag(0, 1.0, 0.0, 0.0)];

        let fused = fuse_streams(locations, readings);

        assert_eq!(fused.len(), 1);
        assert_relative_eq!(fused[0].latitude, 45.0, epsilon = 1e-12);
        assert_relative_eq!(fused[0].longitude, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_order_input_is_sorted_first() {
        let sorted = fuse_streams(
            vec![loc(0, 45.0, 5.0), loc(10, 45.001, 5.001)],
            vec![mag(2, 1.0, 0.0, 0.0), mag(8, 2.0, 0.0, 0.0)],
        );
        let shuffled = fuse_streams(
            vec![loc(10, 45.001, 5.001), loc(0, 45.0, 5.0)],
            vec![mag(8, 2.0, 0.0, 0.0), mag(2, 1.0, 0.0, 0.0)],
        );
        assert_eq!(sorted, shuffled);
    }

    #[test]
    fn test_sorted_entry_point_rejects_backwards_streams() {
        let backwards_locs = vec![loc(10, 45.001, 5.001), loc(0, 45.0, 5.0)];
        let readings = vec![mag(5, 1.0, 0.0, 0.0)];
        assert_eq!(
            fuse_sorted(&backwards_locs, &readings),
            Err(FusionError::UnsortedLocations { index: 1 })
        );

        let locations = vec![loc(0, 45.0, 5.0), loc(10, 45.001, 5.001)];
        let backwards_mags = vec![mag(8, 1.0, 0.0, 0.0), mag(2, 1.0, 0.0, 0.0)];
        assert_eq!(
            fuse_sorted(&locations, &backwards_mags),
            Err(FusionError::UnsortedReadings { index: 1 })
        );
    }

    #[test]
    fn test_sorted_entry_point_accepts_ties() {
        let locations = vec![loc(0, 45.0, 5.0), loc(0, 45.0, 5.0), loc(10, 45.001, 5.001)];
        let readings = vec![mag(5, 1.0, 0.0, 0.0)];
        let fused = fuse_sorted(&locations, &readings).unwrap();
        assert_eq!(fused.len(), 1);
    }

    #[test]
    fn test_fusion_error_display() {
        let errors = vec![
            FusionError::UnsortedLocations { index: 3 },
            FusionError::UnsortedReadings { index: 9 },
        ];
        for err in errors {
            assert!(!format!("{}", err).is_empty());
        }
    }
}
