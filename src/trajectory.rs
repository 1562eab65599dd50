// trajectory.rs — Linear trend of the fused track
//
// Sample index stands in for elapsed time, which treats the trace as evenly
// sampled. That approximation is fine for the smoothed overlay this feeds;
// no residual statistics are computed or reported.

use crate::types::GeoPoint;

/// Ordinary least squares of `values` against their indices.
///
/// Returns `(slope, intercept)`, or None when fewer than two values make a
/// line underdetermined. Indices are distinct, so the normal-equation
/// denominator never vanishes.
pub fn linear_fit(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let n = n as f64;
    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;
    Some((slope, intercept))
}

/// Fit latitude and longitude independently against sample index and return
/// the fitted path, one point per input point. Fewer than two input points
/// yield an empty path.
pub fn fit_trajectory(track: &[GeoPoint]) -> Vec<GeoPoint> {
    let lats: Vec<f64> = track.iter().map(|p| p.lat).collect();
    let lons: Vec<f64> = track.iter().map(|p| p.lon).collect();

    match (linear_fit(&lats), linear_fit(&lons)) {
        (Some((lat_slope, lat_icept)), Some((lon_slope, lon_icept))) => (0..track.len())
            .map(|i| {
                let x = i as f64;
                GeoPoint {
                    lat: lat_icept + lat_slope * x,
                    lon: lon_icept + lon_slope * x,
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}
