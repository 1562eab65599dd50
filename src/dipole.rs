// dipole.rs — Parametric dipole field-line model
//
// Purely illustrative: the lines visualize a dipole anchored at the resolved
// origin and are not derived from the measured field. The dipole axis runs
// north-south; theta is measured from north, so longitude plays the role of
// the equatorial coordinate.

use std::f64::consts::PI;

use crate::types::GeoPoint;

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct DipoleConfig {
    pub loop_count: usize,     // static loops around the origin
    pub loop_radius_deg: f64,  // peak static loop extent, degrees
    pub lat_flatten: f64,      // vertical compression for perspective
    pub min_sin_theta: f64,    // inversion guard near the dipole axis
    pub line_steps: usize,     // dynamic line resolution (steps, points = steps + 1)
    pub loop_step_rad: f64,    // static loop parameter step
}

impl Default for DipoleConfig {
    fn default() -> Self {
        Self {
            loop_count: 12,
            loop_radius_deg: 0.0005,
            lat_flatten: 0.5,
            min_sin_theta: 0.01,
            line_steps: 50,
            loop_step_rad: 0.1,
        }
    }
}

// ─── Field lines ─────────────────────────────────────────────────────────────

/// Outcome of a dynamic field-line query. Samples too close to the dipole
/// axis have no well-defined shell and yield `NoLine`.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldLine {
    NoLine,
    Line(Vec<GeoPoint>),
}

impl FieldLine {
    pub fn points(&self) -> &[GeoPoint] {
        match self {
            FieldLine::NoLine => &[],
            FieldLine::Line(points) => points,
        }
    }

    pub fn is_line(&self) -> bool {
        matches!(self, FieldLine::Line(_))
    }
}

/// Static background field: evenly spaced loops around the origin.
///
/// Loop `i` sits at bearing `2·pi·i / loop_count`; each loop traces
/// `r(t) = loop_radius_deg · sin(t)` for `t` in `[0, pi]`, with the latitude
/// component flattened for perspective.
pub fn static_field_loops(origin: GeoPoint, config: &DipoleConfig) -> Vec<Vec<GeoPoint>> {
    (0..config.loop_count)
        .map(|i| {
            let angle = i as f64 / config.loop_count as f64 * 2.0 * PI;
            (0..)
                .map(|k| k as f64 * config.loop_step_rad)
                .take_while(|&t| t <= PI)
                .map(|t| {
                    let r = config.loop_radius_deg * t.sin();
                    GeoPoint {
                        lat: origin.lat + r * angle.cos() * config.lat_flatten,
                        lon: origin.lon + r * angle.sin(),
                    }
                })
                .collect()
        })
        .collect()
}

/// Shell parameter of the dipole field line through `point`, from
/// `r = L · sin²(theta)`. None when the point sits inside the axis guard,
/// where the inversion blows up.
pub fn shell_parameter(origin: GeoPoint, point: GeoPoint, config: &DipoleConfig) -> Option<f64> {
    let d_lat = point.lat - origin.lat;
    let d_lon = point.lon - origin.lon;
    let r = (d_lat * d_lat + d_lon * d_lon).sqrt();
    let theta = d_lon.atan2(d_lat);

    let sin_theta = theta.sin();
    if sin_theta.abs() < config.min_sin_theta {
        return None;
    }
    Some(r / (sin_theta * sin_theta))
}

/// The full dipole field line passing through `point`.
///
/// Regenerates the shell at fixed resolution. `sin²` discards which side of
/// the axis the point was on, so the longitude offset is mirrored back onto
/// the western lobe when needed. Pure: identical inputs give an identical
/// line.
pub fn line_through_point(origin: GeoPoint, point: GeoPoint, config: &DipoleConfig) -> FieldLine {
    let l_shell = match shell_parameter(origin, point, config) {
        Some(l) => l,
        None => return FieldLine::NoLine,
    };
    let west_lobe = point.lon - origin.lon < 0.0;

    let points = (0..=config.line_steps)
        .map(|i| {
            let t = i as f64 / config.line_steps as f64 * PI;
            let r = l_shell * t.sin() * t.sin();
            let local_lat = r * t.cos();
            let local_lon = r * t.sin();
            let lon_offset = if west_lobe { -local_lon } else { local_lon };
            GeoPoint { lat: origin.lat + local_lat, lon: origin.lon + lon_offset }
        })
        .collect();
    FieldLine::Line(points)
}
