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
use crate::engine::intersect;
use crate::error::Result;
use crate::geometry::{Envelope, Polygon};
use crate::providers::{OutputSink, PolygonProvider, RasterProvider};
use crate::raster::{Raster, RasterView};
use crate::stats::StatsAccumulator;

/// Sequences the four core components through one zone's "data flow" (spec
/// §2): bbox -> shrink the value grid to it -> optional common refinement
/// with the weight grid -> subdivide into memory-bounded tiles -> per tile,
/// engine coverage + provider-read value/weight rasters -> accumulate.
///
/// This is pure wiring: no geometry or statistics logic lives here, only
/// the control flow spec §5's resource-scoping paragraph describes (each
/// zone's grids/rasters/accumulator are owned by one `run_zone` call and
/// dropped when it returns, on both the success and the error path).
pub struct TileRunner<'a> {
    value_provider: &'a dyn RasterProvider,
    weight_provider: Option<&'a dyn RasterProvider>,
    value_nodata: f64,
    weight_nodata: f64,
    store_values: bool,
    max_cells_per_tile: u64,
}

impl<'a> TileRunner<'a> {
    pub fn new(value_provider: &'a dyn RasterProvider, value_nodata: f64, store_values: bool) -> Self {
        TileRunner {
            value_provider,
            weight_provider: None,
            value_nodata,
            weight_nodata: f64::NAN,
            store_values,
            max_cells_per_tile: 1_000_000,
        }
    }

    pub fn with_weights(mut self, weight_provider: &'a dyn RasterProvider, weight_nodata: f64) -> Self {
        self.weight_provider = Some(weight_provider);
        self.weight_nodata = weight_nodata;
        self
    }

    pub fn with_max_cells_per_tile(mut self, max_cells_per_tile: u64) -> Self {
        self.max_cells_per_tile = max_cells_per_tile;
        self
    }

    /// Runs one zone to completion and returns its accumulator. Callers
    /// that want several statistics share this single pass, since the
    /// coverage computation (by far the expensive part) happens once per
    /// tile regardless of how many statistics are ultimately queried.
    pub fn run_zone(&self, bbox: &Envelope, polygon: &Polygon) -> Result<StatsAccumulator> {
        let shrunk = self.value_provider.grid().shrink_to_fit(bbox);

        let work_grid = match self.weight_provider {
            Some(wp) => shrunk.common_grid(wp.grid())?,
            None => shrunk,
        };

        let mut accumulator = StatsAccumulator::new(self.store_values, self.value_nodata, self.weight_nodata);

        for tile in work_grid.subdivide(self.max_cells_per_tile) {
            let coverage = intersect(polygon, &tile.to_infinite())?;
            let values = Self::reproject_onto_tile(self.value_provider, &tile, self.value_nodata)?;

            match self.weight_provider {
                Some(wp) => {
                    let weights = Self::reproject_onto_tile(wp, &tile, self.weight_nodata)?;
                    accumulator.process_weighted(&coverage, &values, &weights)?;
                }
                None => {
                    accumulator.process(&coverage, &values)?;
                }
            }
        }

        Ok(accumulator)
    }

    /// Reads `provider`'s raster for `tile`'s extent and reinterprets it onto
    /// `tile`'s own grid through a `RasterView`. A provider's native
    /// resolution need not match the (possibly common-refined) tile grid --
    /// without this step a finer or offset value/weight raster would trip
    /// `Raster::require_same_grid` inside the accumulator on every tile.
    fn reproject_onto_tile(provider: &dyn RasterProvider, tile: &crate::grid::Grid, nodata: f64) -> Result<Raster<f64>> {
        let native = provider.read(&tile.extent())?;
        let view = RasterView::new(&native, tile.extent(), tile.dx(), tile.dy(), nodata)?;
        Ok(view.to_raster())
    }

    /// Drains `polygons` to completion, writing one result per zone to
    /// `sink`. A zone whose processing fails is logged and skipped; the
    /// run continues with the next zone (spec §7's error policy).
    pub fn run_all(&self, polygons: &mut dyn PolygonProvider, sink: &mut dyn OutputSink) {
        while polygons.next() {
            let id = polygons.current_id().to_string();
            let bbox = polygons.current_bbox();

            let outcome = {
                let polygon = polygons.current_polygon();
                self.run_zone(&bbox, polygon)
            };

            match outcome {
                Ok(accumulator) => {
                    if let Err(e) = sink.write(&id, &accumulator.results_map()) {
                        log::warn!("zone '{}': failed to write output: {}", id, e);
                    }
                }
                Err(e) => {
                    log::warn!("zone '{}' failed: {}", id, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use crate::grid::Grid;
    use crate::providers::InMemoryRasterProvider;
    use crate::raster::Raster;
    use crate::stats::StatKind;

    #[test]
    fn test_run_zone_full_coverage_constant_value() {
        let grid = Grid::new(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        let values = Raster::filled(grid, 5.0_f64);
        let provider = InMemoryRasterProvider::new(values, -9999.0);

        let runner = TileRunner::new(&provider, -9999.0, false);

        let square = Polygon::from_ring(vec![(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0)]);
        let acc = runner.run_zone(&square.bbox(), &square).unwrap();

        assert!((acc.query(StatKind::Count) - 4.0).abs() < 1e-6);
        assert!((acc.query(StatKind::Mean) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_zone_subdivided_matches_single_tile() {
        let grid = Grid::new(Envelope::new(0.0, 0.0, 10.0, 10.0), 1.0, 1.0);
        let values = Raster::filled(grid, 2.0_f64);
        let provider = InMemoryRasterProvider::new(values, -9999.0);

        let square = Polygon::from_ring(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);

        let whole = TileRunner::new(&provider, -9999.0, false)
            .run_zone(&square.bbox(), &square)
            .unwrap();
        let tiled = TileRunner::new(&provider, -9999.0, false)
            .with_max_cells_per_tile(9)
            .run_zone(&square.bbox(), &square)
            .unwrap();

        assert!((whole.query(StatKind::Count) - tiled.query(StatKind::Count)).abs() < 1e-6);
        assert!((whole.query(StatKind::Sum) - tiled.query(StatKind::Sum)).abs() < 1e-6);
    }

    #[test]
    fn test_run_zone_reprojects_mismatched_value_and_weight_resolution() {
        // Value raster is coarse (2.0 cell size); weight raster is finer
        // (1.0). common_grid refines to 1.0, so the value raster must be
        // reinterpreted onto the finer grid before accumulation.
        let value_grid = Grid::new(Envelope::new(0.0, 0.0, 4.0, 4.0), 2.0, 2.0);
        let values = Raster::filled(value_grid, 5.0_f64);
        let value_provider = InMemoryRasterProvider::new(values, -9999.0);

        let weight_grid = Grid::new(Envelope::new(0.0, 0.0, 4.0, 4.0), 1.0, 1.0);
        let weights = Raster::filled(weight_grid, 3.0_f64);
        let weight_provider = InMemoryRasterProvider::new(weights, -9999.0);

        let runner = TileRunner::new(&value_provider, -9999.0, false).with_weights(&weight_provider, -9999.0);

        let square = Polygon::from_ring(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let acc = runner.run_zone(&square.bbox(), &square).unwrap();

        assert!((acc.query(StatKind::Count) - 16.0).abs() < 1e-6);
        assert!((acc.query(StatKind::Mean) - 5.0).abs() < 1e-9);
    }
}
