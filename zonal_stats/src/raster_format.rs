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
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use zonal_core::{Envelope, Grid, InMemoryRasterProvider, Raster};

/// On-disk bincode form of a demo raster: extent, cell size, nodata
/// sentinel and a row-major value buffer. Real raster file I/O (GDAL,
/// NetCDF, ...) is explicitly out of scope (spec §1); this is the smallest
/// stand-in that lets the CLI demonstrate the full pipeline without that
/// dependency.
#[derive(Serialize, Deserialize)]
struct RasterFile {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    dx: f64,
    dy: f64,
    nodata: f64,
    values: Vec<f64>,
}

/// Reads a bincode-serialized [`RasterFile`] and wraps it as an
/// [`InMemoryRasterProvider`], ready to hand to a [`zonal_core::TileRunner`].
pub fn read_raster_provider(path: &Path) -> Result<InMemoryRasterProvider> {
    let reader = BufReader::new(File::open(path)?);
    let file: RasterFile = bincode::deserialize_from(reader)?;

    let grid = Grid::new(
        Envelope::new(file.xmin, file.ymin, file.xmax, file.ymax),
        file.dx,
        file.dy,
    );
    let raster = Raster::new(grid, file.values);

    Ok(InMemoryRasterProvider::new(raster, file.nodata))
}

/// Writes a raster out in the demo bincode format. Used by the test suite
/// and by anyone bootstrapping a `zonal_stats` run without a real data
/// pipeline feeding it.
pub fn write_raster_file(path: &Path, raster: &Raster<f64>, nodata: f64) -> Result<()> {
    let extent = raster.extent();
    let file = RasterFile {
        xmin: extent.xmin,
        ymin: extent.ymin,
        xmax: extent.xmax,
        ymax: extent.ymax,
        dx: raster.xres(),
        dy: raster.yres(),
        nodata,
        values: raster.values().to_vec(),
    };

    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, &file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use zonal_core::RasterProvider;

    fn temp_path(name: &str) -> std::path::PathBuf {
        temp_dir().join(format!("zonal_stats_test_{}", name))
    }

    #[test]
    fn test_write_then_read_roundtrips() {
        let grid = Grid::new(Envelope::new(0.0, 0.0, 4.0, 4.0), 1.0, 1.0);
        let raster = Raster::new(grid, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);

        let path = temp_path("raster.bin");
        write_raster_file(&path, &raster, -9999.0).unwrap();

        let provider = read_raster_provider(&path).unwrap();
        let window = provider.read(&Envelope::new(0.0, 0.0, 4.0, 4.0)).unwrap();
        assert_eq!(window.get(0, 0), 1.0);
        assert_eq!(window.get(3, 3), 16.0);

        std::fs::remove_file(&path).ok();
    }
}
