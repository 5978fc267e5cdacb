/*
This file is part of the Building Aggregration Tool
Copyright (C) 2022 Novel-T

The Building Aggregration Tool is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/
use crate::error::{Result, ZonalError};
use crate::geometry::envelope::Envelope;
use crate::geometry::segment::Segment;
use crate::util::COORD_ABS_EPSILON;

pub type Point = (f64, f64);

/// A closed ring of vertices. The first and last point need not be equal;
/// the engine closes the ring implicitly by connecting the last vertex back
/// to the first.
pub type Ring = Vec<Point>;

/// A polygon, possibly with holes, treated opaquely by callers: the engine
/// only ever asks for its bounding box and its oriented segment stream (spec
/// §3 "Polygon"). Multi-polygons are represented as multiple disjoint outer
/// rings in the same `Polygon`; even-odd fill (spec §4.3 step 1) makes the
/// *caller's* ring winding irrelevant — `Polygon::new` normalizes every
/// ring's orientation by its even-odd nesting depth (outer rings CCW, rings
/// nested under an odd number of others CW) so that the engine's per-cell
/// signed-area accumulation (`engine::intersect`) always resolves holes
/// correctly regardless of how the input wound them.
#[derive(Debug, Clone, Default)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    pub fn new(rings: Vec<Ring>) -> Self {
        Polygon {
            rings: normalize_ring_orientation(rings),
        }
    }

    pub fn from_ring(ring: Ring) -> Self {
        Self::new(vec![ring])
    }

    /// Validates that every coordinate is finite, failing with
    /// `InvalidGeometry` otherwise (spec §4.3 "An infinite/NaN vertex
    /// coordinate fails with InvalidGeometry").
    pub fn validate(&self) -> Result<()> {
        for ring in &self.rings {
            if ring.len() < 3 {
                return Err(ZonalError::InvalidGeometry {
                    reason: format!("ring has only {} vertices, need >= 3", ring.len()),
                });
            }
            for &(x, y) in ring {
                if !x.is_finite() || !y.is_finite() {
                    return Err(ZonalError::InvalidGeometry {
                        reason: format!("non-finite vertex ({}, {})", x, y),
                    });
                }
            }
        }
        Ok(())
    }

    /// Bounding box across all rings. Panics if the polygon has no rings;
    /// callers are expected to validate non-emptiness upstream.
    pub fn bbox(&self) -> Envelope {
        let mut xmin = f64::INFINITY;
        let mut ymin = f64::INFINITY;
        let mut xmax = f64::NEG_INFINITY;
        let mut ymax = f64::NEG_INFINITY;

        for ring in &self.rings {
            for &(x, y) in ring {
                xmin = xmin.min(x);
                ymin = ymin.min(y);
                xmax = xmax.max(x);
                ymax = ymax.max(y);
            }
        }

        assert!(xmin.is_finite(), "polygon has no vertices");
        Envelope::new(xmin, ymin, xmax, ymax)
    }

    /// The oriented segment stream of spec §4.3 step 1: each ring emits one
    /// directed segment per edge, including the closing edge back to the
    /// first vertex.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.rings.iter().flat_map(|ring| {
            let n = ring.len();
            (0..n).map(move |i| {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                Segment::new(a, b)
            })
        })
    }

    /// Even-odd point-in-polygon test, used by tests and by the scanline
    /// flood fill's cross-check. Points exactly on an edge are treated as
    /// inside (ray casting with a half-open edge convention).
    pub fn contains_even_odd(&self, point: Point) -> bool {
        let (px, py) = point;
        let mut inside = false;

        for ring in &self.rings {
            let n = ring.len();
            for i in 0..n {
                let (x0, y0) = ring[i];
                let (x1, y1) = ring[(i + 1) % n];

                let straddles = (y0 > py) != (y1 > py);
                if straddles {
                    let x_at_y = x0 + (py - y0) * (x1 - x0) / (y1 - y0);
                    if px < x_at_y {
                        inside = !inside;
                    }
                }
            }
        }

        inside
    }
}

/// Reverses any ring whose vertex winding disagrees with the even-odd
/// convention implied by its nesting depth among the other rings of the
/// same polygon (depth 0, i.e. not nested under anyone: CCW; nested under
/// an odd number of other rings: CW). This is what lets
/// `engine::intersect`'s per-cell signed-area sum act like even-odd fill
/// without having to resolve nesting on every cell: the sign is baked into
/// each ring once, at construction, instead.
fn normalize_ring_orientation(rings: Vec<Ring>) -> Vec<Ring> {
    let originals = rings.clone();

    rings
        .into_iter()
        .enumerate()
        .map(|(i, mut ring)| {
            if ring.len() < 3 {
                return ring;
            }

            let probe = ring_interior_point(&ring);
            let depth = originals
                .iter()
                .enumerate()
                .filter(|&(j, other)| j != i && other.len() >= 3 && ring_contains_point(other, probe))
                .count();

            let want_ccw = depth % 2 == 0;
            let is_ccw = ring_signed_area(&ring) > 0.0;
            if is_ccw != want_ccw {
                ring.reverse();
            }
            ring
        })
        .collect()
}

/// A point guaranteed to land strictly inside `ring`, used as the
/// nesting-depth probe. The vertex average used here previously only landed
/// inside convex rings; a concave ring's average can fall outside the ring
/// (or inside one of its own holes), misclassifying nesting depth. Instead,
/// take the midpoint of the ring's first non-degenerate edge and nudge it a
/// tiny distance inward along that edge's normal (to the left of the edge
/// for a CCW-wound ring, the right for CW) — a point next to any polygon
/// edge, offset by less than the local feature size, is always inside the
/// polygon regardless of how the rest of the ring is shaped.
fn ring_interior_point(ring: &[Point]) -> Point {
    let n = ring.len();
    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];
        let dx = x1 - x0;
        let dy = y1 - y0;
        let len = (dx * dx + dy * dy).sqrt();
        if len <= COORD_ABS_EPSILON {
            continue;
        }

        let mid = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
        // left-hand normal of the directed edge a -> b.
        let (mut nx, mut ny) = (-dy / len, dx / len);
        if ring_signed_area(ring) <= 0.0 {
            // CW ring: interior is to the right of the directed edge instead.
            nx = -nx;
            ny = -ny;
        }

        let eps = len * 1e-6;
        return (mid.0 + nx * eps, mid.1 + ny * eps);
    }

    // every edge degenerate; `Polygon::validate` rejects rings this short
    // upstream, so this is unreachable in practice.
    ring[0]
}

/// Shoelace signed area of a single (possibly open) ring: positive for
/// counter-clockwise winding, negative for clockwise.
fn ring_signed_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];
        sum += x0 * y1 - x1 * y0;
    }
    sum / 2.0
}

/// Even-odd point-in-ring test over a single ring (the per-ring primitive
/// `Polygon::contains_even_odd` folds over all rings).
fn ring_contains_point(ring: &[Point], point: Point) -> bool {
    let (px, py) = point;
    let mut inside = false;
    let n = ring.len();
    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];

        let straddles = (y0 > py) != (y1 > py);
        if straddles {
            let x_at_y = x0 + (py - y0) * (x1 - x0) / (y1 - y0);
            if px < x_at_y {
                inside = !inside;
            }
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::from_ring(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
    }

    #[test]
    fn test_bbox() {
        let p = square(0.0, 0.0, 4.0, 2.0);
        assert_eq!(p.bbox(), Envelope::new(0.0, 0.0, 4.0, 2.0));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let p = Polygon::from_ring(vec![(0.0, 0.0), (f64::NAN, 1.0), (1.0, 1.0)]);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_degenerate_ring() {
        let p = Polygon::from_ring(vec![(0.0, 0.0), (1.0, 1.0)]);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_contains_even_odd() {
        let p = square(0.0, 0.0, 10.0, 10.0);
        assert!(p.contains_even_odd((5.0, 5.0)));
        assert!(!p.contains_even_odd((15.0, 5.0)));
    }

    #[test]
    fn test_segments_closes_ring() {
        let p = square(0.0, 0.0, 1.0, 1.0);
        let segs: Vec<_> = p.segments().collect();
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[3].b, segs[0].a);
    }

    #[test]
    fn test_ring_interior_point_lands_inside_concave_ring() {
        // an "L" ring: vertex average (2.667, 2.667) falls in the notch,
        // outside the ring entirely -- the interior point must not.
        let l_shape = vec![(0.0, 0.0), (6.0, 0.0), (6.0, 2.0), (2.0, 2.0), (2.0, 6.0), (0.0, 6.0)];
        let probe = ring_interior_point(&l_shape);
        assert!(ring_contains_point(&l_shape, probe));
    }

    #[test]
    fn test_normalize_orientation_unaffected_by_hole_sitting_where_vertex_mean_would_land() {
        // same concave "L" ring as above; a hole ring is placed exactly
        // where the old vertex-mean probe used to land (in the notch, i.e.
        // outside the ring's true body). With the old centroid-based probe
        // this miscounted the outer ring's nesting depth as 1 (since the
        // flawed probe fell inside the hole) and flipped it to the hole's
        // winding; the edge-based probe is unaffected since it always lands
        // in the ring's true interior, nowhere near the notch.
        let outer = vec![(0.0, 0.0), (6.0, 0.0), (6.0, 2.0), (2.0, 2.0), (2.0, 6.0), (0.0, 6.0)];
        let hole = vec![(2.367, 2.367), (2.967, 2.367), (2.967, 2.967), (2.367, 2.967)];

        let p = Polygon::new(vec![outer, hole]);

        assert!(ring_signed_area(&p.rings[0]) > 0.0, "outer ring must stay CCW");
    }
}
