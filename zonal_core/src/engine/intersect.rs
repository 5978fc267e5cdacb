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
use bitvec::vec::BitVec;

use crate::engine::clip::{clip_to_rect, signed_area};
use crate::engine::traversal::cells_touched;
use crate::error::Result;
use crate::geometry::Polygon;
use crate::grid::Grid;
use crate::raster::Raster;

/// The cell-intersection engine's entry point (spec §4.3, §6
/// `intersect(polygon, grid) -> Raster<float>`).
///
/// `grid` is treated as an infinite-grid tile: boundary traversal may touch
/// ghost cells (e.g. a polygon vertex just outside the tile), which are
/// silently dropped, but the returned raster is always sized to the
/// corresponding bounded tile.
///
/// Two passes:
/// 1. Every segment of `polygon` is walked across the grid (`cells_touched`)
///    to find the set of **boundary cells** — cells the polygon's edge
///    actually crosses.
/// 2. Boundary cells get an exact coverage fraction via Sutherland-Hodgman
///    clipping of each ring against the cell rectangle, signed-area summed
///    (outer rings contribute positively, holes negatively). `Polygon::new`
///    normalizes every ring's winding by its even-odd nesting depth, so this
///    sum resolves holes correctly regardless of how the caller wound them
///    (spec §4.3 step 1's "even-odd... insensitive to ring orientation").
///    Every other cell is either fully inside or fully outside, decided by
///    an even-odd point-in-polygon test at the cell center — the per-cell
///    form of the scan-line parity rule of spec §4.3 step 5.
pub fn intersect(polygon: &Polygon, grid: &Grid) -> Result<Raster<f64>> {
    polygon.validate()?;

    let bounded = grid.to_bounded();
    let rows = bounded.bounded_rows();
    let cols = bounded.bounded_cols();
    let n = rows as usize * cols as usize;

    let mut is_boundary: BitVec = BitVec::repeat(false, n);
    for segment in polygon.segments() {
        for (r, c) in cells_touched(&segment, grid) {
            is_boundary.set(r as usize * cols as usize + c as usize, true);
        }
    }

    let mut coverage = vec![0.0_f64; n];
    for r in 0..rows {
        for c in 0..cols {
            let idx = r as usize * cols as usize + c as usize;
            if is_boundary[idx] {
                let cell = bounded.cell_bounds(r as i64, c as i64);
                let mut area = 0.0;
                for ring in &polygon.rings {
                    area += signed_area(&clip_to_rect(ring, &cell));
                }
                coverage[idx] = (area.abs() / cell.area()).clamp(0.0, 1.0);
            } else {
                let center = bounded.cell_center(r as i64, c as i64);
                if polygon.contains_even_odd(center) {
                    coverage[idx] = 1.0;
                }
            }
        }
    }

    Ok(Raster::new(bounded, coverage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Envelope;

    #[test]
    fn test_full_coverage_single_cell() {
        let grid = Grid::new_infinite(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        let square = Polygon::from_ring(vec![(3.0, 3.0), (4.0, 3.0), (4.0, 4.0), (3.0, 4.0)]);

        let coverage = intersect(&square, &grid).unwrap();

        let r = coverage.grid().get_row(3.5).unwrap() as u32;
        let c = coverage.grid().get_column(3.5).unwrap() as u32;
        assert!((coverage.get(r, c) - 1.0).abs() < 1e-9);

        let total: f64 = coverage.values().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_half_cell_polygon() {
        let grid = Grid::new_infinite(Envelope::new(0.0, 0.0, 1.0, 1.0), 1.0, 1.0);
        // left half of the single cell [0,1]x[0,1].
        let half = Polygon::from_ring(vec![(0.0, 0.0), (0.5, 0.0), (0.5, 1.0), (0.0, 1.0)]);

        let coverage = intersect(&half, &grid).unwrap();
        assert_eq!(coverage.rows(), 1);
        assert_eq!(coverage.cols(), 1);
        assert!((coverage.get(0, 0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_sums_to_polygon_area() {
        let grid = Grid::new_infinite(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        // a 3x2.5 axis-aligned rectangle straddling cell boundaries.
        let poly = Polygon::from_ring(vec![(1.5, 1.0), (4.5, 1.0), (4.5, 3.5), (1.5, 3.5)]);

        let coverage = intersect(&poly, &grid).unwrap();
        let total: f64 = coverage.values().iter().sum();
        let expected_area = 3.0 * 2.5;
        assert!((total - expected_area).abs() < 1e-6);
    }

    #[test]
    fn test_hole_wound_same_direction_as_outer_is_still_subtracted() {
        let grid = Grid::new_infinite(Envelope::new(0.0, 0.0, 6.0, 6.0), 1.0, 1.0);
        let outer = vec![(1.0, 1.0), (5.0, 1.0), (5.0, 5.0), (1.0, 5.0)];
        // wound in the SAME direction as `outer` (both traced right, up,
        // left, down) -- the scenario a caller's polygon format can easily
        // hand in without guaranteeing opposite winding for holes.
        let hole = vec![(2.5, 2.5), (3.5, 2.5), (3.5, 3.5), (2.5, 3.5)];
        let poly = Polygon::new(vec![outer, hole]);

        let coverage = intersect(&poly, &grid).unwrap();

        // the cell straddling the hole's bottom-left corner is 3/4 covered:
        // the outer square covers it fully, the hole removes its top-right
        // quarter.
        let r = coverage.grid().get_row(2.5).unwrap() as u32;
        let c = coverage.grid().get_column(2.5).unwrap() as u32;
        assert!((coverage.get(r, c) - 0.75).abs() < 1e-9);

        let total: f64 = coverage.values().iter().sum();
        let expected_area = 4.0 * 4.0 - 1.0 * 1.0;
        assert!((total - expected_area).abs() < 1e-6);
    }

    #[test]
    fn test_coverage_in_unit_range() {
        let grid = Grid::new_infinite(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        let poly = Polygon::from_ring(vec![(0.2, 0.3), (6.7, 1.1), (5.3, 8.9), (1.1, 6.6)]);

        let coverage = intersect(&poly, &grid).unwrap();
        for &v in coverage.values() {
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
