// geometry.rs — 2-D predicates over footprint rings and track paths
//
// Everything works in plain lat/lon degree space on geo primitives with the
// (x, y) = (lon, lat) convention. Rings are implicitly closed: the edge from
// the last vertex back to the first is always considered.

use geo::{Coord, LineString};

/// Ray-casting containment test for an implicitly closed ring.
///
/// Casts a horizontal east-going ray from the point and counts edge
/// crossings; an odd count means inside. Points exactly on an edge are
/// neither reliably inside nor outside.
///
/// # Arguments
/// * `ring` - Polygon vertices, no closing duplicate required
/// * `point` - Query position (x = lon, y = lat)
pub fn ring_contains(ring: &LineString<f64>, point: Coord<f64>) -> bool {
    let verts = &ring.0;
    if verts.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = verts.len() - 1;
    for i in 0..verts.len() {
        let a = verts[i];
        let b = verts[j];
        if (a.y > point.y) != (b.y > point.y) {
            let crossing_lon = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < crossing_lon {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Strict orientation test: true when walking a -> b -> c turns
/// counter-clockwise. Collinear triples report false.
fn ccw(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> bool {
    (c.x - a.x) * (b.y - a.y) > (b.x - a.x) * (c.y - a.y)
}

/// Proper intersection test for segments ab and cd.
///
/// Built on four strict orientation comparisons, so collinear overlap and
/// most boundary touches count as non-intersecting.
pub fn segments_intersect(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>, d: Coord<f64>) -> bool {
    ccw(a, c, d) != ccw(b, c, d) && ccw(a, b, c) != ccw(a, b, d)
}

/// True when any edge of the (implicitly closed) ring crosses any segment of
/// the open path.
pub fn ring_intersects_path(ring: &LineString<f64>, path: &LineString<f64>) -> bool {
    let verts = &ring.0;
    if verts.len() < 2 || path.0.len() < 2 {
        return false;
    }

    for i in 0..verts.len() {
        let a = verts[i];
        let b = verts[(i + 1) % verts.len()];
        for seg in path.0.windows(2) {
            if segments_intersect(a, b, seg[0], seg[1]) {
                return true;
            }
        }
    }
    false
}

/// Arithmetic mean of the ring vertices. None for an empty ring.
pub fn ring_centroid(ring: &LineString<f64>) -> Option<Coord<f64>> {
    if ring.0.is_empty() {
        return None;
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for c in &ring.0 {
        sum_x += c.x;
        sum_y += c.y;
    }
    let n = ring.0.len() as f64;
    Some(Coord { x: sum_x / n, y: sum_y / n })
}

/// Smallest squared distance (in degrees squared) from the point to any ring
/// vertex. None for an empty ring.
pub fn min_vertex_dist_sq(ring: &LineString<f64>, point: Coord<f64>) -> Option<f64> {
    if ring.0.is_empty() {
        return None;
    }

    let mut best = f64::INFINITY;
    for c in &ring.0 {
        let dx = c.x - point.x;
        let dy = c.y - point.y;
        let dist = dx * dx + dy * dy;
        if dist < best {
            best = dist;
        }
    }
    Some(best)
}
