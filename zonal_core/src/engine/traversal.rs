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
use crate::geometry::Segment;
use crate::grid::Grid;
use crate::util::COORD_ABS_EPSILON;

/// Walks `segment` across `grid` (always treated as infinite, so lookups
/// never fail) and returns the bounded-grid `(row, col)` indices of every
/// cell the segment passes through, in order from `segment.a` to
/// `segment.b`. This is spec §4.3 step 2's boundary traversal, stripped to
/// just the cell membership it discovers — the coverage fraction itself is
/// computed separately, per cell, by clipping (see `engine::clip`).
///
/// A cell index that falls in the ghost margin (row or column `< 0` or
/// `>= bounded_count`) is never returned — only cells of the bounded tile
/// matter for coverage.
pub fn cells_touched(segment: &Segment, grid: &Grid) -> Vec<(i64, i64)> {
    if segment.is_degenerate() {
        return bounded_cell_at(grid, segment.a.0, segment.a.1)
            .into_iter()
            .collect();
    }

    let inf = grid.to_infinite();
    let breakpoints = crossing_parameters(segment, &inf);

    let mut cells = Vec::with_capacity(breakpoints.len());
    let mut prev_t = 0.0;
    for &t in &breakpoints {
        let mid_t = (prev_t + t) / 2.0;
        let (x, y) = segment.at(mid_t);
        if let Some(cell) = bounded_cell_at(&inf, x, y) {
            if cells.last() != Some(&cell) {
                cells.push(cell);
            }
        }
        prev_t = t;
    }

    cells
}

fn bounded_cell_at(grid: &Grid, x: f64, y: f64) -> Option<(i64, i64)> {
    let r = grid.get_row(y).ok()?;
    let c = grid.get_column(x).ok()?;
    let (rb, cb) = grid.native_to_bounded(r, c);

    if rb >= 0 && rb < grid.bounded_rows() as i64 && cb >= 0 && cb < grid.bounded_cols() as i64 {
        Some((rb, cb))
    } else {
        None
    }
}

/// Sorted list of parametric `t` values in `(0, 1]` at which `segment`
/// crosses a grid line of `grid`, plus the final endpoint `1.0`. Consecutive
/// values bound a sub-segment that lies entirely within one cell.
fn crossing_parameters(segment: &Segment, grid: &Grid) -> Vec<f64> {
    let mut ts = Vec::new();

    let row_a = grid.get_row(segment.a.1).expect("infinite grid never fails");
    let row_b = grid.get_row(segment.b.1).expect("infinite grid never fails");
    let col_a = grid.get_column(segment.a.0).expect("infinite grid never fails");
    let col_b = grid.get_column(segment.b.0).expect("infinite grid never fails");

    if row_a != row_b && segment.dy().abs() > COORD_ABS_EPSILON {
        let (lo, hi) = if row_a < row_b { (row_a, row_b) } else { (row_b, row_a) };
        for r in lo..hi {
            // the boundary between native row r and r+1 is the bottom of
            // cell r (top of cell r+1).
            let y = grid.cell_bounds(r, 0).ymin;
            let t = (y - segment.a.1) / segment.dy();
            if t > 0.0 && t < 1.0 {
                ts.push(t);
            }
        }
    }

    if col_a != col_b && segment.dx().abs() > COORD_ABS_EPSILON {
        let (lo, hi) = if col_a < col_b { (col_a, col_b) } else { (col_b, col_a) };
        for c in lo..hi {
            let x = grid.cell_bounds(0, c).xmax;
            let t = (x - segment.a.0) / segment.dx();
            if t > 0.0 && t < 1.0 {
                ts.push(t);
            }
        }
    }

    ts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    ts.push(1.0);
    ts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Envelope;

    #[test]
    fn test_segment_within_one_cell() {
        let grid = Grid::new(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        let seg = Segment::new((1.2, 1.2), (1.8, 1.8));
        let cells = cells_touched(&seg, &grid);
        assert_eq!(cells, vec![(8, 1)]);
    }

    #[test]
    fn test_segment_crosses_several_cells() {
        let grid = Grid::new(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        // horizontal segment along y=5.5 from x=0.5 to x=3.5: crosses 4 cells.
        let seg = Segment::new((0.5, 5.5), (3.5, 5.5));
        let cells = cells_touched(&seg, &grid);
        assert_eq!(cells, vec![(4, 0), (4, 1), (4, 2), (4, 3)]);
    }

    #[test]
    fn test_out_of_tile_vertex_ignored() {
        let grid = Grid::new(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        let seg = Segment::new((-5.0, 5.5), (0.5, 5.5));
        let cells = cells_touched(&seg, &grid);
        // only the in-tile portion contributes a bounded cell.
        assert_eq!(cells, vec![(4, 0)]);
    }
}
