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
use crate::geometry::Envelope;
use crate::util::{
    approx_eq_rel, ge_tolerant, le_tolerant, round_half_away_from_zero, ChunkPairIterator, COORD_REL_EPSILON,
    GRID_REL_EPSILON,
};

/// A regular axis-aligned grid over an extent, with row 0 at the top
/// (largest y) and column 0 at the left (smallest x).
///
/// Two flavors exist (spec §3/§4.1):
/// - **bounded**: row/column indices are `[0, rows) x [0, cols)`; a
///   coordinate outside the extent is an error.
/// - **infinite**: the bounded grid padded by one ghost row/column on each
///   side. Visible indices shift by +1 relative to the bounded grid (ghost
///   top/left index is 0, ghost bottom/right index is `bounded + 1`), and
///   `rows()`/`cols()` report `2 + bounded_count`. No coordinate lookup ever
///   fails on an infinite grid — anything outside the bounded extent (by any
///   amount) lands in the one ghost row/column on that side.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    extent: Envelope,
    dx: f64,
    dy: f64,
    bounded_rows: u32,
    bounded_cols: u32,
    infinite: bool,
}

impl Grid {
    /// Builds a bounded grid over `extent` with cell size `(dx, dy)`.
    /// Row/column counts are derived by round-half-away-from-zero with a
    /// relative tolerance of ~1e-6 to absorb floating point error in the
    /// extent (spec §3 "Grid" invariants).
    pub fn new(extent: Envelope, dx: f64, dy: f64) -> Self {
        Self::build(extent, dx, dy, false)
    }

    /// Builds the infinite variant: same extent and cell size, but with a
    /// one-cell ghost margin on every side (spec §3 "For the infinite
    /// variant").
    pub fn new_infinite(extent: Envelope, dx: f64, dy: f64) -> Self {
        Self::build(extent, dx, dy, true)
    }

    fn build(extent: Envelope, dx: f64, dy: f64, infinite: bool) -> Self {
        assert!(dx > 0.0, "dx must be positive, got {}", dx);
        assert!(dy > 0.0, "dy must be positive, got {}", dy);

        let bounded_cols = round_count(extent.width() / dx);
        let bounded_rows = round_count(extent.height() / dy);

        Grid {
            extent,
            dx,
            dy,
            bounded_rows,
            bounded_cols,
            infinite,
        }
    }

    /// Returns the infinite variant of this grid (a no-op if already
    /// infinite).
    pub fn to_infinite(&self) -> Grid {
        Grid {
            infinite: true,
            ..self.clone()
        }
    }

    /// Returns the bounded variant of this grid (a no-op if already
    /// bounded).
    pub fn to_bounded(&self) -> Grid {
        Grid {
            infinite: false,
            ..self.clone()
        }
    }

    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    pub fn extent(&self) -> Envelope {
        self.extent
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Reported row count: the bounded count, or `2 + bounded` for the
    /// infinite variant.
    pub fn rows(&self) -> u32 {
        if self.infinite {
            self.bounded_rows + 2
        } else {
            self.bounded_rows
        }
    }

    /// Reported column count: the bounded count, or `2 + bounded` for the
    /// infinite variant.
    pub fn cols(&self) -> u32 {
        if self.infinite {
            self.bounded_cols + 2
        } else {
            self.bounded_cols
        }
    }

    /// Bounded row/column counts regardless of this grid's flavor. Used
    /// internally and by [`Grid::subdivide`], which always tiles the bounded
    /// extent.
    pub fn bounded_rows(&self) -> u32 {
        self.bounded_rows
    }

    pub fn bounded_cols(&self) -> u32 {
        self.bounded_cols
    }

    /// Row index of the cell containing `y`. Bounded grids fail with
    /// `OutOfExtent` when `y` is outside `[ymin, ymax]`; infinite grids never
    /// fail, returning a ghost index (`0` above `ymax`, `bounded_rows + 1`
    /// below `ymin`). Coordinates exactly on an interior grid line round
    /// toward the smaller row index (the cell above), per spec §4.1.
    pub fn get_row(&self, y: f64) -> Result<i64> {
        let unshifted = signed_index(self.extent.ymax, y, self.dy);

        if self.infinite {
            Ok(clamp_to_ghost(unshifted, self.bounded_rows))
        } else if y < self.extent.ymin && !approx_eq_rel(y, self.extent.ymin, COORD_REL_EPSILON) {
            Err(self.out_of_extent(0.0, y))
        } else if y > self.extent.ymax && !approx_eq_rel(y, self.extent.ymax, COORD_REL_EPSILON) {
            Err(self.out_of_extent(0.0, y))
        } else {
            Ok(unshifted.clamp(0, self.bounded_rows as i64 - 1))
        }
    }

    /// Column index of the cell containing `x`. See [`Grid::get_row`] for
    /// the bounded/infinite and tie-breaking semantics (mirrored on x).
    pub fn get_column(&self, x: f64) -> Result<i64> {
        let col = column_index(self.extent.xmin, x, self.dx);

        if self.infinite {
            Ok(clamp_to_ghost(col, self.bounded_cols))
        } else if x < self.extent.xmin && !approx_eq_rel(x, self.extent.xmin, COORD_REL_EPSILON) {
            Err(self.out_of_extent(x, 0.0))
        } else if x > self.extent.xmax && !approx_eq_rel(x, self.extent.xmax, COORD_REL_EPSILON) {
            Err(self.out_of_extent(x, 0.0))
        } else {
            Ok(col.clamp(0, self.bounded_cols as i64 - 1))
        }
    }

    fn out_of_extent(&self, x: f64, y: f64) -> ZonalError {
        ZonalError::OutOfExtent {
            x,
            y,
            xmin: self.extent.xmin,
            xmax: self.extent.xmax,
            ymin: self.extent.ymin,
            ymax: self.extent.ymax,
        }
    }

    /// Bounds of the cell at native (possibly ghost-shifted) index `(r, c)`.
    pub fn cell_bounds(&self, r: i64, c: i64) -> Envelope {
        let (rb, cb) = self.to_bounded_index(r, c);

        let ymax = self.extent.ymax - rb as f64 * self.dy;
        let ymin = self.extent.ymax - (rb + 1) as f64 * self.dy;
        let xmin = self.extent.xmin + cb as f64 * self.dx;
        let xmax = self.extent.xmin + (cb + 1) as f64 * self.dx;

        Envelope { xmin, ymin, xmax, ymax }
    }

    /// Center coordinate of the cell at native index `(r, c)`.
    pub fn cell_center(&self, r: i64, c: i64) -> (f64, f64) {
        let b = self.cell_bounds(r, c);
        ((b.xmin + b.xmax) / 2.0, (b.ymin + b.ymax) / 2.0)
    }

    fn to_bounded_index(&self, r: i64, c: i64) -> (i64, i64) {
        if self.infinite {
            (r - 1, c - 1)
        } else {
            (r, c)
        }
    }

    /// Converts a native index (ghost-shifted if this grid is infinite) to
    /// the corresponding bounded-grid index. Used by the intersection
    /// engine to map a traversal hit on an infinite tile back to an index
    /// into the bounded coverage raster.
    pub fn native_to_bounded(&self, r: i64, c: i64) -> (i64, i64) {
        self.to_bounded_index(r, c)
    }

    /// Smallest grid-aligned super-box of `to_fit`, snapped to `self`'s grid
    /// lines (spec §4.1 `shrink_to_fit`). Idempotent: shrinking an
    /// already-snapped box is a no-op.
    pub fn shrink_to_fit(&self, to_fit: &Envelope) -> Grid {
        let xmin = snap_down(self.extent.xmin, to_fit.xmin, self.dx);
        let ymin = snap_down(self.extent.ymin, to_fit.ymin, self.dy);
        let xmax = snap_up(self.extent.xmin, to_fit.xmax, self.dx);
        let ymax = snap_up(self.extent.ymin, to_fit.ymax, self.dy);

        Grid::build(Envelope::new(xmin, ymin, xmax, ymax), self.dx, self.dy, self.infinite)
    }

    /// True iff `dx`/`other.dx` (or its reciprocal) is an integer within
    /// `GRID_REL_EPSILON`, likewise `dy`, and the origins are aligned on the
    /// finer resolution (spec §4.1 `compatible_with`).
    pub fn compatible_with(&self, other: &Grid) -> bool {
        axis_compatible(self.dx, other.dx, self.extent.xmin, other.extent.xmin)
            && axis_compatible(self.dy, other.dy, self.extent.ymin, other.extent.ymin)
    }

    /// The grid with the finer cell size on each axis, whose extent is the
    /// union of `self` and `other`, snapped to the finer grid lines (spec
    /// §4.1 `common_grid`). Requires `compatible_with`.
    pub fn common_grid(&self, other: &Grid) -> Result<Grid> {
        if !self.compatible_with(other) {
            return Err(ZonalError::IncompatibleGrids {
                lhs_dx: self.dx,
                rhs_dx: other.dx,
                lhs_dy: self.dy,
                rhs_dy: other.dy,
            });
        }

        let dx = self.dx.min(other.dx);
        let dy = self.dy.min(other.dy);
        let union = self.extent.union(&other.extent);

        let finer = if dx == self.dx { self } else { other };
        Ok(finer.shrink_to_fit(&union).with_cell_size(dx, dy))
    }

    fn with_cell_size(&self, dx: f64, dy: f64) -> Grid {
        Grid::build(self.extent, dx, dy, self.infinite)
    }

    /// Lazily yields non-overlapping sub-grids of the same cell size whose
    /// union (row-major, top-left first) equals `self`'s bounded extent,
    /// each with `rows * cols <= max_cells` (spec §4.1 `subdivide`).
    pub fn subdivide(&self, max_cells: u64) -> impl Iterator<Item = Grid> + '_ {
        assert!(max_cells > 0);

        let max_cols = (max_cells.max(1) as f64).sqrt().floor().max(1.0) as u32;
        // Prefer wide tiles: as many whole columns per tile as fit within
        // max_cells, then as many rows as fit given that column count.
        let cols_per_tile = (max_cells / max_cols.max(1) as u64)
            .max(1)
            .min(self.bounded_cols.max(1) as u64) as u32;
        let rows_per_tile = (max_cells / cols_per_tile.max(1) as u64)
            .max(1)
            .min(self.bounded_rows.max(1) as u64) as u32;

        let row_chunks: Vec<(u32, u32)> = if self.bounded_rows == 0 {
            Vec::new()
        } else {
            ChunkPairIterator::new(0u32, self.bounded_rows - 1, rows_per_tile).collect()
        };
        let col_chunks: Vec<(u32, u32)> = if self.bounded_cols == 0 {
            Vec::new()
        } else {
            ChunkPairIterator::new(0u32, self.bounded_cols - 1, cols_per_tile).collect()
        };

        row_chunks.into_iter().flat_map(move |(r0, r1)| {
            let col_chunks = col_chunks.clone();
            col_chunks.into_iter().map(move |(c0, c1)| {
                let xmin = self.extent.xmin + c0 as f64 * self.dx;
                let xmax = self.extent.xmin + (c1 + 1) as f64 * self.dx;
                let ymax = self.extent.ymax - r0 as f64 * self.dy;
                let ymin = self.extent.ymax - (r1 + 1) as f64 * self.dy;

                Grid::build(Envelope::new(xmin, ymin, xmax, ymax), self.dx, self.dy, self.infinite)
            })
        })
    }

    /// Absolute row-index offset between `self` and `other`'s origins,
    /// measured in cells of the finer resolution. Requires compatibility;
    /// symmetric (sign-independent).
    pub fn row_offset(&self, other: &Grid) -> Result<u32> {
        if !self.compatible_with(other) {
            return Err(ZonalError::IncompatibleGrids {
                lhs_dx: self.dx,
                rhs_dx: other.dx,
                lhs_dy: self.dy,
                rhs_dy: other.dy,
            });
        }
        let dy = self.dy.min(other.dy);
        Ok((((self.extent.ymax - other.extent.ymax) / dy).round().abs()) as u32)
    }

    /// Absolute column-index offset between `self` and `other`'s origins,
    /// measured in cells of the finer resolution. Requires compatibility;
    /// symmetric (sign-independent).
    pub fn col_offset(&self, other: &Grid) -> Result<u32> {
        if !self.compatible_with(other) {
            return Err(ZonalError::IncompatibleGrids {
                lhs_dx: self.dx,
                rhs_dx: other.dx,
                lhs_dy: self.dy,
                rhs_dy: other.dy,
            });
        }
        let dx = self.dx.min(other.dx);
        Ok((((self.extent.xmin - other.extent.xmin) / dx).round().abs()) as u32)
    }
}

fn round_count(raw: f64) -> u32 {
    let rounded = round_half_away_from_zero(raw);
    assert!(
        (raw - rounded).abs() <= GRID_REL_EPSILON.max(1e-6) * raw.abs().max(1.0),
        "grid extent does not divide evenly into cell size: {} cells (raw {})",
        rounded,
        raw
    );
    rounded as u32
}

/// Index of `y` counting down from `hi` in steps of `step`, with ties
/// (exactly on a grid line) resolved toward the smaller index.
fn signed_index(hi: f64, y: f64, step: f64) -> i64 {
    let raw = (hi - y) / step;
    tie_break_floor(raw)
}

/// Index of `x` counting up from `lo` in steps of `step`, with ties resolved
/// toward the smaller index.
fn column_index(lo: f64, x: f64, step: f64) -> i64 {
    let raw = (x - lo) / step;
    tie_break_floor(raw)
}

/// `floor(raw)`, except when `raw` is within `COORD_REL_EPSILON` of an
/// integer `n`, in which case the result is `n - 1` (the smaller-index
/// cell), per spec §4.1's tie-break rule.
fn tie_break_floor(raw: f64) -> i64 {
    let nearest = raw.round();
    if approx_eq_rel(raw, nearest, COORD_REL_EPSILON) {
        nearest as i64 - 1
    } else {
        raw.floor() as i64
    }
}

/// Maps an unshifted bounded index (possibly negative or `>= bounded`) to an
/// infinite-grid index: `0` if below the bounded range, `bounded + 1` if
/// above it, else `unshifted + 1`.
fn clamp_to_ghost(unshifted: i64, bounded: u32) -> i64 {
    if unshifted < 0 {
        0
    } else if unshifted >= bounded as i64 {
        bounded as i64 + 1
    } else {
        unshifted + 1
    }
}

fn snap_down(grid_origin: f64, value: f64, step: f64) -> f64 {
    let offset = (value - grid_origin) / step;
    if approx_eq_rel(offset, offset.round(), GRID_REL_EPSILON) {
        return grid_origin + offset.round() * step;
    }
    grid_origin + offset.floor() * step
}

fn snap_up(grid_origin: f64, value: f64, step: f64) -> f64 {
    let offset = (value - grid_origin) / step;
    if approx_eq_rel(offset, offset.round(), GRID_REL_EPSILON) {
        return grid_origin + offset.round() * step;
    }
    grid_origin + offset.ceil() * step
}

fn axis_compatible(a: f64, b: f64, origin_a: f64, origin_b: f64) -> bool {
    let ratio = if a >= b { a / b } else { b / a };
    let ratio_is_integer = approx_eq_rel(ratio, ratio.round(), GRID_REL_EPSILON) && ratio.round() >= 1.0;
    if !ratio_is_integer {
        return false;
    }

    let finer = a.min(b);
    let origin_diff = (origin_a - origin_b) / finer;
    approx_eq_rel(origin_diff, origin_diff.round(), GRID_REL_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_world_bounded_dims() {
        let g = Grid::new(Envelope::new(-180.0, -90.0, 180.0, 90.0), 0.5, 0.5);
        assert_eq!(g.rows(), 360);
        assert_eq!(g.cols(), 720);
    }

    #[test]
    fn test_infinite_grid_dims() {
        let g = Grid::new_infinite(Envelope::new(-180.0, -90.0, 180.0, 90.0), 0.5, 0.5);
        assert_eq!(g.rows(), 362);
        assert_eq!(g.cols(), 722);
    }

    #[test]
    fn test_shrink_idempotence() {
        let g = Grid::new(Envelope::new(-180.5, -90.0, 180.0, 90.0), 0.1, 0.1);
        let once = g.shrink_to_fit(&Envelope::new(
            8.5328125, 1.6762207, 16.1833984, 13.0785156,
        ));
        let twice = once.shrink_to_fit(&once.extent());

        assert_eq!(once.bounded_rows(), twice.bounded_rows());
        assert_eq!(once.bounded_cols(), twice.bounded_cols());
        assert_eq!(once.extent(), twice.extent());
    }

    #[test]
    fn test_shrink_contains_box() {
        let g = Grid::new(Envelope::new(0.0, 0.0, 100.0, 100.0), 1.0, 1.0);
        let b = Envelope::new(2.3, 3.7, 9.1, 12.2);
        let shrunk = g.shrink_to_fit(&b);

        assert!(le_tolerant(shrunk.extent().xmin, b.xmin));
        assert!(ge_tolerant(shrunk.extent().xmax, b.xmax));
        assert!(le_tolerant(shrunk.extent().ymin, b.ymin));
        assert!(ge_tolerant(shrunk.extent().ymax, b.ymax));
    }

    #[test]
    fn test_get_row_col_bounded_errors_outside() {
        let g = Grid::new(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        assert!(g.get_row(-1.0).is_err());
        assert!(g.get_row(11.0).is_err());
        assert!(g.get_column(-1.0).is_err());
        assert!(g.get_column(11.0).is_err());
    }

    #[test]
    fn test_get_row_col_bounded_inside() {
        let g = Grid::new(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        // top-left cell
        assert_eq!(g.get_row(9.5).unwrap(), 0);
        assert_eq!(g.get_column(0.5).unwrap(), 0);
        // bottom-right cell
        assert_eq!(g.get_row(0.5).unwrap(), 9);
        assert_eq!(g.get_column(9.5).unwrap(), 9);
    }

    #[test]
    fn test_get_row_tie_break_smaller_index() {
        let g = Grid::new(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        // y = 9.0 is the boundary between row 0 and row 1; smaller index (row 0) wins.
        assert_eq!(g.get_row(9.0).unwrap(), 0);
        // x = 1.0 is the boundary between col 0 and col 1; smaller index (col 0) wins.
        assert_eq!(g.get_column(1.0).unwrap(), 0);
    }

    #[test]
    fn test_get_row_col_infinite_never_fails() {
        let g = Grid::new_infinite(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        assert_eq!(g.get_row(100.0).unwrap(), 0);
        assert_eq!(g.get_row(-100.0).unwrap(), g.bounded_rows() as i64 + 1);
        assert_eq!(g.get_column(-100.0).unwrap(), 0);
        assert_eq!(g.get_column(100.0).unwrap(), g.bounded_cols() as i64 + 1);
    }

    #[test]
    fn test_compatible_with() {
        let a = Grid::new(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        let b = Grid::new(Envelope::new(2.0, 3.0, 12.0, 13.0), 0.5, 0.5);
        assert!(a.compatible_with(&b));

        let c = Grid::new(Envelope::new(2.25, 3.0, 12.0, 13.0), 0.5, 0.5);
        assert!(!a.compatible_with(&c));
    }

    #[test]
    fn test_common_grid_symmetric() {
        let a = Grid::new(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        let b = Grid::new(Envelope::new(2.0, 3.0, 12.0, 13.0), 0.5, 0.5);

        let ab = a.common_grid(&b).unwrap();
        let ba = b.common_grid(&a).unwrap();

        assert_eq!(ab.dx(), ba.dx());
        assert_eq!(ab.dy(), ba.dy());
        assert_eq!(ab.dx(), 0.5_f64.min(1.0));
        assert_eq!(ab.extent(), ba.extent());
    }

    #[test]
    fn test_subdivide_covers_grid_exactly() {
        let g = Grid::new(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        let tiles: Vec<_> = g.subdivide(9).collect();

        let mut total_cells = 0u64;
        for t in &tiles {
            assert!((t.bounded_rows() as u64) * (t.bounded_cols() as u64) <= 9);
            total_cells += t.bounded_rows() as u64 * t.bounded_cols() as u64;
        }
        assert_eq!(total_cells, 100);
    }

    #[test]
    fn test_row_col_offset_symmetric() {
        let a = Grid::new(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        let b = Grid::new(Envelope::new(3.0, 4.0, 13.0, 14.0), 1.0, 1.0);

        assert_eq!(a.row_offset(&b).unwrap(), b.row_offset(&a).unwrap());
        assert_eq!(a.col_offset(&b).unwrap(), b.col_offset(&a).unwrap());
        assert_eq!(a.col_offset(&b).unwrap(), 3);
    }
}
