// spatial.rs — Anchoring the field model to the built environment
//
// Decides where the synthetic dipole should be centered. Footprints come
// from an external provider as bare vertex rings; an empty set is a normal
// steady state, not an error, and degrades to the strongest raw sample.

use geo::{Coord, LineString};

use crate::geometry::{min_vertex_dist_sq, ring_centroid, ring_contains, ring_intersects_path};
use crate::types::{FusedSample, GeoPoint};

/// Squared vertex-distance gate for the nearest-building fallback. deg²
pub const NEAR_NODE_THRESHOLD_DEG_SQ: f64 = 1e-4;

/// A building footprint as an implicitly closed vertex ring.
#[derive(Clone, Debug)]
pub struct BuildingFootprint {
    pub id: u64,
    pub ring: LineString<f64>,
}

impl BuildingFootprint {
    /// Build a footprint from (lat, lon) vertex pairs.
    pub fn from_latlon(id: u64, vertices: &[(f64, f64)]) -> Self {
        let coords: Vec<Coord<f64>> =
            vertices.iter().map(|&(lat, lon)| Coord { x: lon, y: lat }).collect();
        BuildingFootprint { id, ring: LineString::new(coords) }
    }
}

/// Which resolution rule produced the origin.
#[derive(Clone, Debug, PartialEq)]
pub enum OriginSource {
    /// A footprint containing a track point or crossed by a track segment.
    TrackIntersection { building_id: u64 },
    /// A footprint whose nearest vertex sits within the distance gate of the
    /// strongest sample.
    NearestVertex { building_id: u64 },
    /// No footprint qualified; the strongest raw sample anchors the field.
    PeakSample,
}

impl std::fmt::Display for OriginSource {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OriginSource::TrackIntersection { building_id } => {
                write!(f, "building {} on the track", building_id)
            }
            OriginSource::NearestVertex { building_id } => {
                write!(f, "nearest vertex of building {}", building_id)
            }
            OriginSource::PeakSample => write!(f, "peak magnitude sample"),
        }
    }
}

/// The anchor point for the dipole model. Recomputed whenever the trace or
/// footprint set changes; never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldOrigin {
    pub point: GeoPoint,
    pub source: OriginSource,
}

/// The fused sample with the strongest total field. First occurrence wins on
/// ties. None only for an empty trace.
pub fn peak_sample(trace: &[FusedSample]) -> Option<&FusedSample> {
    let mut peak: Option<&FusedSample> = None;
    for sample in trace {
        match peak {
            Some(best) if sample.magnitude <= best.magnitude => {}
            _ => peak = Some(sample),
        }
    }
    peak
}

/// Resolve the most plausible physical origin of the field.
///
/// Rules, in priority order:
/// 1. the first footprint (in supplied order) that contains a track point or
///    is crossed by a track segment, anchored at its vertex centroid;
/// 2. the footprint with the vertex closest to the strongest sample, if that
///    vertex is within [`NEAR_NODE_THRESHOLD_DEG_SQ`];
/// 3. the strongest sample itself.
///
/// Returns None only when the trace is empty.
pub fn resolve_field_origin(
    trace: &[FusedSample],
    footprints: &[BuildingFootprint],
) -> Option<FieldOrigin> {
    let peak = peak_sample(trace)?;

    let track =
        LineString::new(trace.iter().map(|s| Coord { x: s.longitude, y: s.latitude }).collect());

    if let Some(hit) = footprints.iter().find(|b| touches_track(b, &track)) {
        if let Some(c) = ring_centroid(&hit.ring) {
            log::debug!("field origin anchored to building {} on the track", hit.id);
            return Some(FieldOrigin {
                point: GeoPoint { lat: c.y, lon: c.x },
                source: OriginSource::TrackIntersection { building_id: hit.id },
            });
        }
    }

    let peak_coord = peak.position().coord();
    let mut nearest: Option<(&BuildingFootprint, f64)> = None;
    for footprint in footprints {
        if let Some(dist) = min_vertex_dist_sq(&footprint.ring, peak_coord) {
            match nearest {
                Some((_, best)) if dist >= best => {}
                _ => nearest = Some((footprint, dist)),
            }
        }
    }
    if let Some((footprint, dist)) = nearest {
        if dist < NEAR_NODE_THRESHOLD_DEG_SQ {
            if let Some(c) = ring_centroid(&footprint.ring) {
                log::debug!(
                    "field origin anchored to building {} near the peak sample",
                    footprint.id
                );
                return Some(FieldOrigin {
                    point: GeoPoint { lat: c.y, lon: c.x },
                    source: OriginSource::NearestVertex { building_id: footprint.id },
                });
            }
        }
    }

    log::debug!("no footprint qualified, anchoring to the peak sample");
    Some(FieldOrigin { point: peak.position(), source: OriginSource::PeakSample })
}

fn touches_track(footprint: &BuildingFootprint, track: &LineString<f64>) -> bool {
    track.0.iter().any(|&p| ring_contains(&footprint.ring, p))
        || ring_intersects_path(&footprint.ring, track)
}
