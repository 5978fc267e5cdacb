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
use crate::geometry::{Envelope, Point};

/// Sutherland-Hodgman clip of a closed ring against an axis-aligned
/// rectangle. The ring need not be explicitly closed (first point need not
/// repeat as the last); this mirrors `Polygon::segments`'s implicit closing.
///
/// Clipping against each of the rectangle's four half-planes in turn is the
/// standard formulation; a rectangle is convex so this always terminates
/// with a (possibly empty) convex polygon.
pub fn clip_to_rect(ring: &[Point], rect: &Envelope) -> Vec<Point> {
    let mut pts = ring.to_vec();

    pts = clip_half_plane(&pts, |p| p.0 >= rect.xmin, |a, b| intersect_x(a, b, rect.xmin));
    pts = clip_half_plane(&pts, |p| p.0 <= rect.xmax, |a, b| intersect_x(a, b, rect.xmax));
    pts = clip_half_plane(&pts, |p| p.1 >= rect.ymin, |a, b| intersect_y(a, b, rect.ymin));
    pts = clip_half_plane(&pts, |p| p.1 <= rect.ymax, |a, b| intersect_y(a, b, rect.ymax));

    pts
}

fn clip_half_plane(
    points: &[Point],
    inside: impl Fn(Point) -> bool,
    intersect: impl Fn(Point, Point) -> Point,
) -> Vec<Point> {
    if points.is_empty() {
        return Vec::new();
    }

    let n = points.len();
    let mut output = Vec::with_capacity(n + 1);

    for i in 0..n {
        let cur = points[i];
        let prev = points[(i + n - 1) % n];
        let cur_in = inside(cur);
        let prev_in = inside(prev);

        if cur_in {
            if !prev_in {
                output.push(intersect(prev, cur));
            }
            output.push(cur);
        } else if prev_in {
            output.push(intersect(prev, cur));
        }
    }

    output
}

fn intersect_x(a: Point, b: Point, x: f64) -> Point {
    let t = (x - a.0) / (b.0 - a.0);
    (x, a.1 + t * (b.1 - a.1))
}

fn intersect_y(a: Point, b: Point, y: f64) -> Point {
    let t = (y - a.1) / (b.1 - a.1);
    (a.0 + t * (b.0 - a.0), y)
}

/// Signed area of a (possibly open) ring via the shoelace formula. Positive
/// for a counter-clockwise ring, negative for clockwise — summing this
/// across a polygon's outer (CCW) and hole (CW) rings yields the polygon's
/// net area without needing an explicit even-odd fill on the clipped
/// fragments.
pub fn signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }

    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];
        sum += x0 * y1 - x1 * y0;
    }
    sum / 2.0
}
