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
use std::collections::HashMap;

use crate::error::Result;
use crate::geometry::{Envelope, Polygon};
use crate::grid::Grid;
use crate::raster::{Raster, RasterView};

/// A stream of zones to compute statistics for (spec §6 "Polygon
/// provider"). Cursor-style: `next()` advances to (and reports whether
/// there is) a next zone; the `current_*` accessors describe it.
pub trait PolygonProvider {
    fn next(&mut self) -> bool;
    fn current_id(&self) -> &str;
    fn current_bbox(&self) -> Envelope;
    fn current_polygon(&self) -> &Polygon;
}

/// A source of raster data the engine reads tiles from (spec §6 "Raster
/// provider"). `read` must return cells covering at least `extent`, using
/// its own nodata sentinel for any cell it cannot supply.
pub trait RasterProvider {
    fn grid(&self) -> &Grid;
    fn read(&self, extent: &Envelope) -> Result<Raster<f64>>;
}

/// Where per-zone results go (spec §6 "Output sink").
///
/// `write`'s error is boxed rather than `ZonalError`: a sink's failures are
/// typically I/O (a closed file, a full disk), which isn't one of spec §7's
/// engine/geometry error kinds.
pub trait OutputSink {
    fn write(&mut self, id: &str, stats: &HashMap<String, f64>) -> std::result::Result<(), Box<dyn std::error::Error>>;
}

/// `Vec`-backed [`PolygonProvider`], used by tests and as the simplest
/// possible real implementation of the interface.
pub struct InMemoryPolygonProvider {
    zones: Vec<(String, Polygon)>,
    index: isize,
}

impl InMemoryPolygonProvider {
    pub fn new(zones: Vec<(String, Polygon)>) -> Self {
        InMemoryPolygonProvider { zones, index: -1 }
    }
}

impl PolygonProvider for InMemoryPolygonProvider {
    fn next(&mut self) -> bool {
        self.index += 1;
        (self.index as usize) < self.zones.len()
    }

    fn current_id(&self) -> &str {
        &self.zones[self.index as usize].0
    }

    fn current_bbox(&self) -> Envelope {
        self.zones[self.index as usize].1.bbox()
    }

    fn current_polygon(&self) -> &Polygon {
        &self.zones[self.index as usize].1
    }
}

/// A single, fully materialized [`Raster`] served as a [`RasterProvider`]
/// via [`RasterView`] re-windowing. Used by tests and by the CLI's smallest
/// demo path.
pub struct InMemoryRasterProvider {
    raster: Raster<f64>,
    nodata: f64,
}

impl InMemoryRasterProvider {
    pub fn new(raster: Raster<f64>, nodata: f64) -> Self {
        InMemoryRasterProvider { raster, nodata }
    }
}

impl RasterProvider for InMemoryRasterProvider {
    fn grid(&self) -> &Grid {
        self.raster.grid()
    }

    fn read(&self, extent: &Envelope) -> Result<Raster<f64>> {
        let window = self.raster.grid().shrink_to_fit(extent);
        let view = RasterView::new(
            &self.raster,
            window.extent(),
            window.dx(),
            window.dy(),
            self.nodata,
        )?;
        Ok(view.to_raster())
    }
}
