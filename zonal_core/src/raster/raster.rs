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
use crate::geometry::Envelope;
use crate::grid::Grid;
use float_cmp::{ApproxEq, F64Margin};

/// True iff `val` should be treated as absent: non-finite (NaN/infinite)
/// values are always nodata, as are values within a few ULPs of
/// `no_data_value`. Mirrors the teacher's `is_nodata_f64`.
#[inline]
pub fn is_nodata_f64(val: f64, no_data_value: f64) -> bool {
    if !val.is_finite() {
        return true;
    }
    if !no_data_value.is_finite() {
        return false;
    }
    val.approx_eq(
        no_data_value,
        F64Margin {
            ulps: 5,
            epsilon: f64::EPSILON * 5.0,
        },
    )
}

/// A dense, exclusively-owned `rows x cols` buffer of cell values tagged
/// with the [`Grid`] it lives on (spec §3 "Raster<T>").
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    grid: Grid,
    values: Vec<T>,
}

impl<T: Copy> Raster<T> {
    /// Builds a raster from a row-major `values` buffer; panics if its
    /// length doesn't match `grid.rows() * grid.cols()`.
    pub fn new(grid: Grid, values: Vec<T>) -> Self {
        assert_eq!(
            values.len(),
            grid.rows() as usize * grid.cols() as usize,
            "value buffer length does not match grid dimensions"
        );
        Raster { grid, values }
    }

    /// Builds a raster of `grid.rows() * grid.cols()` cells, all `fill`.
    pub fn filled(grid: Grid, fill: T) -> Self {
        let n = grid.rows() as usize * grid.cols() as usize;
        Raster {
            grid,
            values: vec![fill; n],
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rows(&self) -> u32 {
        self.grid.rows()
    }

    pub fn cols(&self) -> u32 {
        self.grid.cols()
    }

    pub fn xmin(&self) -> f64 {
        self.grid.extent().xmin
    }

    pub fn xmax(&self) -> f64 {
        self.grid.extent().xmax
    }

    pub fn ymin(&self) -> f64 {
        self.grid.extent().ymin
    }

    pub fn ymax(&self) -> f64 {
        self.grid.extent().ymax
    }

    pub fn xres(&self) -> f64 {
        self.grid.dx()
    }

    pub fn yres(&self) -> f64 {
        self.grid.dy()
    }

    pub fn extent(&self) -> Envelope {
        self.grid.extent()
    }

    fn index(&self, r: u32, c: u32) -> usize {
        debug_assert!(r < self.rows() && c < self.cols());
        r as usize * self.cols() as usize + c as usize
    }

    pub fn get(&self, r: u32, c: u32) -> T {
        self.values[self.index(r, c)]
    }

    pub fn set(&mut self, r: u32, c: u32, value: T) {
        let idx = self.index(r, c);
        self.values[idx] = value;
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Same extent, same cell size, and element-wise equal values (spec
    /// §4.2: `Raster<T>` equality).
    pub fn same_extent_and_values(&self, other: &Raster<T>) -> bool
    where
        T: PartialEq,
    {
        self.grid.extent() == other.grid.extent()
            && self.grid.dx() == other.grid.dx()
            && self.grid.dy() == other.grid.dy()
            && self.values == other.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Envelope;

    fn grid() -> Grid {
        Grid::new(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0)
    }

    #[test]
    fn test_filled_dims() {
        let r = Raster::filled(grid(), 0.0_f64);
        assert_eq!(r.rows(), 10);
        assert_eq!(r.cols(), 10);
    }

    #[test]
    fn test_get_set() {
        let mut r = Raster::filled(grid(), 0.0_f64);
        r.set(3, 4, 9.5);
        assert_eq!(r.get(3, 4), 9.5);
        assert_eq!(r.get(0, 0), 0.0);
    }

    #[test]
    fn test_is_nodata() {
        let nodata = -9999.0;
        assert!(is_nodata_f64(nodata, nodata));
        assert!(is_nodata_f64(f64::NAN, nodata));
        assert!(!is_nodata_f64(1.0, nodata));
    }
}
