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
use crate::grid::Grid;
use crate::raster::Raster;

/// A read-only reinterpretation of a source [`Raster`] onto a target extent
/// whose cell size refines the source's (spec §4.2 `RasterView<T>`).
///
/// Lookup maps a target cell's center to the source cell containing it
/// (floor-division of coordinates, same as [`Grid::get_row`]/[`Grid::get_column`]
/// away from tie boundaries); cells whose center falls outside the source
/// grid's bounded extent yield the configured nodata sentinel.
pub struct RasterView<'a, T> {
    source: &'a Raster<T>,
    grid: Grid,
    nodata: T,
}

impl<'a, T: Copy> RasterView<'a, T> {
    /// Builds a view of `source` onto `extent` at cell size `(dx, dy)`.
    /// Fails with `IncompatibleGrids` unless `dx`/`dy` refine the source's
    /// cell size and the origins align (the same test `Grid::compatible_with`
    /// already performs).
    pub fn new(source: &'a Raster<T>, extent: Envelope, dx: f64, dy: f64, nodata: T) -> Result<Self> {
        let grid = Grid::new(extent, dx, dy);

        if !source.grid().compatible_with(&grid) {
            return Err(ZonalError::IncompatibleGrids {
                lhs_dx: source.grid().dx(),
                rhs_dx: dx,
                lhs_dy: source.grid().dy(),
                rhs_dy: dy,
            });
        }

        Ok(RasterView { source, grid, nodata })
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

    /// Value of target cell `(r, c)`: the source cell whose center contains
    /// this cell's center, or the nodata sentinel if that falls outside the
    /// source's bounded extent.
    pub fn get(&self, r: u32, c: u32) -> T {
        let (cx, cy) = self.grid.cell_center(r as i64, c as i64);
        let source_grid = self.source.grid();

        match (source_grid.get_row(cy), source_grid.get_column(cx)) {
            (Ok(sr), Ok(sc)) => self.source.get(sr as u32, sc as u32),
            _ => self.nodata,
        }
    }

    /// Materializes the view as an owned `Raster<T>`.
    pub fn to_raster(&self) -> Raster<T> {
        let mut values = Vec::with_capacity(self.rows() as usize * self.cols() as usize);
        for r in 0..self.rows() {
            for c in 0..self.cols() {
                values.push(self.get(r, c));
            }
        }
        Raster::new(self.grid.clone(), values)
    }
}
